//! Typed payloads for encrypted submissions and their decrypted contents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Inbound (encrypted) types
// =============================================================================

/// Encrypted submission as delivered in the webhook `data` object.
///
/// Other keys FormSG sends alongside (`formId`, `submissionId`, `created`)
/// are ignored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptParams {
    /// `base64(pubkey);base64(nonce):base64(ciphertext)`
    pub encrypted_content: String,
    /// Payload version
    pub version: u32,
    /// Encrypted and signed verified claims, same envelope format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_content: Option<String>,
    /// Field id to encrypted attachment download URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_download_urls: Option<BTreeMap<String, String>>,
}

impl DecryptParams {
    pub fn new(encrypted_content: impl Into<String>, version: u32) -> Self {
        Self {
            encrypted_content: encrypted_content.into(),
            version,
            verified_content: None,
            attachment_download_urls: None,
        }
    }
}

/// Body returned by an attachment download URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedAttachment {
    pub encrypted_file: EncryptedFile,
}

/// Base64 fields of an encrypted attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedFile {
    pub submission_public_key: String,
    pub nonce: String,
    pub binary: String,
}

/// Decoded encrypted attachment, ready to be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentBinary {
    pub submission_public_key: [u8; 32],
    pub nonce: [u8; 24],
    pub ciphertext: Vec<u8>,
}

// =============================================================================
// Decrypted types
// =============================================================================

/// Form field types FormSG can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Section,
    Radiobutton,
    Dropdown,
    Checkbox,
    Nric,
    Email,
    Table,
    Number,
    Rating,
    YesNo,
    Decimal,
    /// Short text
    Textfield,
    /// Long text
    Textarea,
    Attachment,
    Date,
    Mobile,
    Homeno,
}

/// Multi-valued answer: checkbox selections or table rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerArray {
    Flat(Vec<String>),
    Nested(Vec<Vec<String>>),
}

/// The single answer a field carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Array(AnswerArray),
}

/// One decrypted form response.
///
/// Holds at most one of `answer`/`answerArray`; a field without either is
/// only accepted when it is a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireFormField", into = "WireFormField")]
pub struct FormField {
    pub id: String,
    pub question: String,
    pub field_type: FieldType,
    pub is_header: bool,
    pub answer: Option<Answer>,
    pub signature: Option<String>,
}

impl FormField {
    /// Plain-text answer, if this field has one.
    pub fn answer_text(&self) -> Option<&str> {
        match &self.answer {
            Some(Answer::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Filename of an uploaded attachment, if this is a filled attachment field.
    pub fn attachment_filename(&self) -> Option<&str> {
        if self.field_type != FieldType::Attachment {
            return None;
        }
        self.answer_text().filter(|name| !name.is_empty())
    }
}

/// JSON shape of a form field as FormSG encrypts it.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFormField {
    #[serde(rename = "_id")]
    id: String,
    question: String,
    field_type: FieldType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_header: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer_array: Option<AnswerArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

impl TryFrom<WireFormField> for FormField {
    type Error = String;

    fn try_from(wire: WireFormField) -> Result<Self, Self::Error> {
        let answer = match (wire.answer, wire.answer_array) {
            (Some(_), Some(_)) => {
                return Err(format!("field {} has both answer and answerArray", wire.id))
            }
            (Some(text), None) => Some(Answer::Text(text)),
            (None, Some(array)) => Some(Answer::Array(array)),
            (None, None) if wire.is_header => None,
            (None, None) => return Err(format!("field {} has no answer", wire.id)),
        };

        Ok(FormField {
            id: wire.id,
            question: wire.question,
            field_type: wire.field_type,
            is_header: wire.is_header,
            answer,
            signature: wire.signature,
        })
    }
}

impl From<FormField> for WireFormField {
    fn from(field: FormField) -> Self {
        let (answer, answer_array) = match field.answer {
            Some(Answer::Text(text)) => (Some(text), None),
            Some(Answer::Array(array)) => (None, Some(array)),
            None => (None, None),
        };

        WireFormField {
            id: field.id,
            question: field.question,
            field_type: field.field_type,
            is_header: field.is_header,
            answer,
            answer_array,
            signature: field.signature,
        }
    }
}

/// Decrypted submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecryptedContent {
    pub responses: Vec<FormField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<Map<String, Value>>,
}

/// A decrypted attachment and the filename the respondent uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Decrypted submission plus every attachment it references, keyed by field id.
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptedAttachments {
    pub content: DecryptedContent,
    pub attachments: BTreeMap<String, DecryptedAttachment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_field_text_answer() {
        let field: FormField = serde_json::from_str(
            r#"{"_id":"a1","question":"Email","fieldType":"email","answer":"test@open.gov.sg"}"#,
        )
        .unwrap();

        assert_eq!(field.field_type, FieldType::Email);
        assert!(!field.is_header);
        assert_eq!(field.answer_text(), Some("test@open.gov.sg"));
    }

    #[test]
    fn test_form_field_answer_arrays() {
        let checkbox: FormField = serde_json::from_str(
            r#"{"_id":"c1","question":"Checkbox","fieldType":"checkbox","answerArray":["Option 2"]}"#,
        )
        .unwrap();
        assert_eq!(
            checkbox.answer,
            Some(Answer::Array(AnswerArray::Flat(vec!["Option 2".to_string()])))
        );

        let table: FormField = serde_json::from_str(
            r#"{"_id":"t1","question":"Table","fieldType":"table","answerArray":[["a","b"],["c","d"]]}"#,
        )
        .unwrap();
        assert!(matches!(
            table.answer,
            Some(Answer::Array(AnswerArray::Nested(ref rows))) if rows.len() == 2
        ));
    }

    #[test]
    fn test_form_field_rejects_both_answers() {
        let result: Result<FormField, _> = serde_json::from_str(
            r#"{"_id":"x","question":"Q","fieldType":"textfield","answer":"a","answerArray":["b"]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_form_field_missing_answer() {
        let result: Result<FormField, _> =
            serde_json::from_str(r#"{"_id":"x","question":"Q","fieldType":"textfield"}"#);
        assert!(result.is_err());

        let header: FormField = serde_json::from_str(
            r#"{"_id":"h","question":"Header","fieldType":"section","isHeader":true}"#,
        )
        .unwrap();
        assert!(header.is_header);
        assert!(header.answer.is_none());
    }

    #[test]
    fn test_form_field_rejects_unknown_field_type() {
        let result: Result<FormField, _> = serde_json::from_str(
            r#"{"_id":"x","question":"Q","fieldType":"signature_pad","answer":"a"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_form_field_serializes_wire_names() {
        let field = FormField {
            id: "y1".to_string(),
            question: "Yes/No".to_string(),
            field_type: FieldType::YesNo,
            is_header: false,
            answer: Some(Answer::Text("Yes".to_string())),
            signature: None,
        };

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"_id": "y1", "question": "Yes/No", "fieldType": "yes_no", "answer": "Yes"})
        );
    }

    #[test]
    fn test_attachment_filename() {
        let filled: FormField = serde_json::from_str(
            r#"{"_id":"f1","question":"Upload","fieldType":"attachment","answer":"cat.png"}"#,
        )
        .unwrap();
        let empty: FormField = serde_json::from_str(
            r#"{"_id":"f2","question":"Upload","fieldType":"attachment","answer":""}"#,
        )
        .unwrap();
        let text: FormField = serde_json::from_str(
            r#"{"_id":"f3","question":"Name","fieldType":"textfield","answer":"cat.png"}"#,
        )
        .unwrap();

        assert_eq!(filled.attachment_filename(), Some("cat.png"));
        assert_eq!(empty.attachment_filename(), None);
        assert_eq!(text.attachment_filename(), None);
    }

    #[test]
    fn test_decrypt_params_from_webhook_data() {
        let params: DecryptParams = serde_json::from_str(
            r#"{
                "formId": "someFormId",
                "submissionId": "someSubmissionId",
                "version": 1,
                "created": "2020-03-02T08:02:51.649Z",
                "encryptedContent": "a;b:c",
                "attachmentDownloadUrls": {"f1": "https://example.com/f1"}
            }"#,
        )
        .unwrap();

        assert_eq!(params.encrypted_content, "a;b:c");
        assert_eq!(params.version, 1);
        assert!(params.verified_content.is_none());
        assert_eq!(
            params.attachment_download_urls.unwrap().get("f1").map(String::as_str),
            Some("https://example.com/f1")
        );
    }

    #[test]
    fn test_encrypted_attachment_wire_shape() {
        let attachment: EncryptedAttachment = serde_json::from_str(
            r#"{"encryptedFile":{"submissionPublicKey":"pk","nonce":"n","binary":"b"}}"#,
        )
        .unwrap();
        assert_eq!(attachment.encrypted_file.submission_public_key, "pk");
        assert_eq!(attachment.encrypted_file.binary, "b");
    }
}
