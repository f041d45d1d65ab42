use super::*;
use shared::domain::Step;

fn filled_record() -> FormRecord {
    FieldName::ALL
        .into_iter()
        .fold(FormRecord::default(), |record, field| {
            record.with_field(field, format!("{}-value", field.wire_name()))
        })
}

#[test]
fn set_replaces_only_the_named_field() {
    for target in FieldName::ALL {
        let before = filled_record();
        let mut after = before.clone();
        after.set(target, "changed");

        for field in FieldName::ALL {
            if field == target {
                assert_eq!(after.get(field), "changed");
            } else {
                assert_eq!(after.get(field), before.get(field), "{field} was touched");
            }
        }
    }
}

#[test]
fn repeated_edits_keep_last_value_per_field() {
    let mut record = FormRecord::default();
    record.set(FieldName::Email, "a@x.com");
    record.set(FieldName::Name, "Ada");
    record.set(FieldName::Email, "b@x.com");

    assert_eq!(record.email, "b@x.com");
    assert_eq!(record.name, "Ada");
    assert!(record.phone.is_empty());
}

#[test]
fn entries_follow_wire_order() {
    let record = filled_record();
    let names = record
        .entries()
        .map(|(field, _)| field.wire_name())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "name",
            "email",
            "phone",
            "address",
            "age",
            "department",
            "designation",
            "placeOfWork",
            "code"
        ]
    );
}

#[test]
fn missing_treats_whitespace_as_empty() {
    let record = FormRecord::default()
        .with_field(FieldName::Phone, "555-0100")
        .with_field(FieldName::Address, "   ");

    assert_eq!(
        record.missing(Step::CollectingDetails.fields()),
        vec![
            FieldName::Address,
            FieldName::Age,
            FieldName::Department,
            FieldName::Designation,
            FieldName::PlaceOfWork
        ]
    );
}

#[test]
fn attachments_replace_and_clear_per_slot() {
    let mut attachments = Attachments::default();
    attachments.set(
        AttachmentSlot::Image,
        Some(Attachment::new("me.png", vec![1, 2, 3])),
    );
    attachments.set(
        AttachmentSlot::Signature,
        Some(Attachment::new("sig.png", vec![4])),
    );
    attachments.set(
        AttachmentSlot::Image,
        Some(Attachment::new("me2.png", vec![9])),
    );

    let present = attachments
        .present()
        .map(|(slot, attachment)| (slot, attachment.filename.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        present,
        vec![
            (AttachmentSlot::Image, "me2.png"),
            (AttachmentSlot::Signature, "sig.png")
        ]
    );

    attachments.set(AttachmentSlot::Image, None);
    assert!(attachments.get(AttachmentSlot::Image).is_none());
    assert_eq!(attachments.present().count(), 1);
}

#[test]
fn reset_restores_initial_store() {
    let mut store = FormStore::default();
    store.set_field(FieldName::Email, "a@x.com");
    store.set_attachment(
        AttachmentSlot::Signature,
        Some(Attachment::new("sig.png", vec![1])),
    );
    store
        .apply(WorkflowTransition::OtpDelivered)
        .expect("deliver");

    store.reset();

    assert_eq!(store, FormStore::default());
    assert!(store.record().is_blank());
}

#[tokio::test]
async fn attachment_from_path_guesses_mime_type() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("portrait.png");
    tokio::fs::write(&path, b"\x89PNG").await.expect("write");

    let attachment = Attachment::from_path(&path).await.expect("load");

    assert_eq!(attachment.filename, "portrait.png");
    assert_eq!(attachment.mime_type.as_deref(), Some("image/png"));
    assert_eq!(attachment.bytes, b"\x89PNG".to_vec());
}

#[tokio::test]
async fn attachment_from_missing_path_reports_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Attachment::from_path(&dir.path().join("absent.jpg"))
        .await
        .expect_err("missing file");
    assert!(err.to_string().contains("failed to read attachment"));
}
