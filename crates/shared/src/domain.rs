use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }
    };
}

id_newtype!(WorkflowEpoch);
id_newtype!(RequestSeq);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Name,
    Email,
    Phone,
    Address,
    Age,
    Department,
    Designation,
    PlaceOfWork,
    #[serde(rename = "code")]
    OtpCode,
}

impl FieldName {
    /// Wire order used for multipart submissions.
    pub const ALL: [FieldName; 9] = [
        FieldName::Name,
        FieldName::Email,
        FieldName::Phone,
        FieldName::Address,
        FieldName::Age,
        FieldName::Department,
        FieldName::Designation,
        FieldName::PlaceOfWork,
        FieldName::OtpCode,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            FieldName::Name => "name",
            FieldName::Email => "email",
            FieldName::Phone => "phone",
            FieldName::Address => "address",
            FieldName::Age => "age",
            FieldName::Department => "department",
            FieldName::Designation => "designation",
            FieldName::PlaceOfWork => "placeOfWork",
            FieldName::OtpCode => "code",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldName::Name => "Name",
            FieldName::Email => "Email",
            FieldName::Phone => "Phone Number",
            FieldName::Address => "Address",
            FieldName::Age => "Age",
            FieldName::Department => "Department",
            FieldName::Designation => "Designation",
            FieldName::PlaceOfWork => "Place of Work",
            FieldName::OtpCode => "Enter OTP",
        }
    }

    pub fn step(self) -> Step {
        match self {
            FieldName::Name | FieldName::Email | FieldName::OtpCode => Step::CollectingIdentity,
            _ => Step::CollectingDetails,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FieldName {
    type Err = SchemaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', '-'], "");
        let field = match normalized.as_str() {
            "name" => FieldName::Name,
            "email" => FieldName::Email,
            "phone" => FieldName::Phone,
            "address" => FieldName::Address,
            "age" => FieldName::Age,
            "department" => FieldName::Department,
            "designation" => FieldName::Designation,
            "placeofwork" => FieldName::PlaceOfWork,
            "code" | "otp" | "otpcode" => FieldName::OtpCode,
            _ => return Err(SchemaError::UnknownField(raw.trim().to_string())),
        };
        Ok(field)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    CollectingIdentity,
    CollectingDetails,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::CollectingIdentity => 1,
            Step::CollectingDetails => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::CollectingIdentity => "Step 1: Enter Your Details",
            Step::CollectingDetails => "Step 2: Fill Remaining Details",
        }
    }

    pub fn fields(self) -> &'static [FieldName] {
        match self {
            Step::CollectingIdentity => &[FieldName::Name, FieldName::Email, FieldName::OtpCode],
            Step::CollectingDetails => &[
                FieldName::Phone,
                FieldName::Address,
                FieldName::Age,
                FieldName::Department,
                FieldName::Designation,
                FieldName::PlaceOfWork,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentSlot {
    Image,
    Signature,
}

impl AttachmentSlot {
    pub const ALL: [AttachmentSlot; 2] = [AttachmentSlot::Image, AttachmentSlot::Signature];

    pub fn wire_name(self) -> &'static str {
        match self {
            AttachmentSlot::Image => "image",
            AttachmentSlot::Signature => "signature",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttachmentSlot::Image => "Upload Image",
            AttachmentSlot::Signature => "Upload Signature",
        }
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for AttachmentSlot {
    type Err = SchemaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "image" | "photo" | "portrait" => Ok(AttachmentSlot::Image),
            "signature" => Ok(AttachmentSlot::Signature),
            _ => Err(SchemaError::UnknownSlot(raw.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_serialize_to_wire_names() {
        for field in FieldName::ALL {
            let encoded = serde_json::to_string(&field).expect("serialize");
            assert_eq!(encoded, format!("\"{}\"", field.wire_name()));
        }
    }

    #[test]
    fn parses_field_aliases() {
        assert_eq!("placeOfWork".parse::<FieldName>().unwrap(), FieldName::PlaceOfWork);
        assert_eq!("place_of_work".parse::<FieldName>().unwrap(), FieldName::PlaceOfWork);
        assert_eq!("OTP".parse::<FieldName>().unwrap(), FieldName::OtpCode);
        assert!(matches!(
            "nickname".parse::<FieldName>(),
            Err(SchemaError::UnknownField(name)) if name == "nickname"
        ));
    }

    #[test]
    fn every_field_belongs_to_exactly_one_step() {
        for field in FieldName::ALL {
            let owners = [Step::CollectingIdentity, Step::CollectingDetails]
                .into_iter()
                .filter(|step| step.fields().contains(&field))
                .collect::<Vec<_>>();
            assert_eq!(owners, vec![field.step()]);
        }
    }

    #[test]
    fn parses_slots() {
        assert_eq!("Signature".parse::<AttachmentSlot>().unwrap(), AttachmentSlot::Signature);
        assert!("resume".parse::<AttachmentSlot>().is_err());
    }
}
