//! `X-FormSG-Signature` header parsing.

use std::str::FromStr;

use crate::error::FormsgError;

/// HTTP header FormSG uses to sign webhook deliveries.
pub const SIGNATURE_HEADER: &str = "X-FormSG-Signature";

/// Parsed `v1=<sig>,t=<epoch>,s=<submissionId>,f=<formId>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Base64 Ed25519 signature
    pub signature: String,
    /// Signing time, epoch milliseconds
    pub epoch: u64,
    pub submission_id: String,
    pub form_id: String,
}

impl SignatureHeader {
    /// String FormSG signs: `{uri}.{submissionId}.{formId}.{epoch}`.
    pub fn base_string(&self, uri: &str) -> String {
        format!(
            "{}.{}.{}.{}",
            uri, self.submission_id, self.form_id, self.epoch
        )
    }
}

impl FromStr for SignatureHeader {
    type Err = FormsgError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let mut signature = None;
        let mut epoch = None;
        let mut submission_id = None;
        let mut form_id = None;

        for token in header.split(',') {
            let (key, value) = token
                .trim()
                .split_once('=')
                .ok_or_else(|| malformed(&format!("token {token:?} is not key=value")))?;

            if value.is_empty() {
                return Err(malformed(&format!("{key} is empty")));
            }

            let slot = match key {
                "v1" => &mut signature,
                "t" => &mut epoch,
                "s" => &mut submission_id,
                "f" => &mut form_id,
                other => return Err(malformed(&format!("unexpected key {other:?}"))),
            };

            if slot.replace(value).is_some() {
                return Err(malformed(&format!("duplicate key {key}")));
            }
        }

        let epoch = epoch
            .ok_or_else(|| malformed("missing t"))?
            .parse::<u64>()
            .map_err(|_| malformed("t is not an epoch in milliseconds"))?;

        Ok(SignatureHeader {
            signature: signature.ok_or_else(|| malformed("missing v1"))?.to_string(),
            epoch,
            submission_id: submission_id.ok_or_else(|| malformed("missing s"))?.to_string(),
            form_id: form_id.ok_or_else(|| malformed("missing f"))?.to_string(),
        })
    }
}

fn malformed(reason: &str) -> FormsgError {
    FormsgError::HeaderMalformed(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "v1=KMirkrGJLPqu+Na+gdZLUxl9ZDgf2PnNGPnSoG1FuTMRUTiQ6o0jB/GTj1XFjn2s9JtsL5GiCmYROpjJhDyxCw==,t=1583136171649,s=someSubmissionId,f=someFormId";

    #[test]
    fn test_parse_header() {
        let header: SignatureHeader = HEADER.parse().unwrap();

        assert_eq!(
            header.signature,
            "KMirkrGJLPqu+Na+gdZLUxl9ZDgf2PnNGPnSoG1FuTMRUTiQ6o0jB/GTj1XFjn2s9JtsL5GiCmYROpjJhDyxCw=="
        );
        assert_eq!(header.epoch, 1583136171649);
        assert_eq!(header.submission_id, "someSubmissionId");
        assert_eq!(header.form_id, "someFormId");
    }

    #[test]
    fn test_parse_header_any_order() {
        let header: SignatureHeader = "f=form,s=sub,t=42,v1=c2ln".parse().unwrap();
        assert_eq!(header.form_id, "form");
        assert_eq!(header.epoch, 42);
    }

    #[test]
    fn test_parse_header_missing_fields() {
        for header in [
            "t=1,s=sub,f=form",
            "v1=sig,s=sub,f=form",
            "v1=sig,t=1,f=form",
            "v1=sig,t=1,s=sub",
            "",
        ] {
            assert!(
                matches!(header.parse::<SignatureHeader>(), Err(FormsgError::HeaderMalformed(_))),
                "expected {header:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_parse_header_rejects_bad_tokens() {
        for header in [
            "v1=sig,t=abc,s=sub,f=form",
            "v1=sig,t=-5,s=sub,f=form",
            "v1=sig,t=1,s=sub,f=form,x=extra",
            "v1=sig,t=1,s=sub,f=form,f=again",
            "v1=sig,t=1,s=,f=form",
            "v1=sig,t=1,s,f=form",
        ] {
            assert!(
                matches!(header.parse::<SignatureHeader>(), Err(FormsgError::HeaderMalformed(_))),
                "expected {header:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_base_string() {
        let header: SignatureHeader = HEADER.parse().unwrap();
        assert_eq!(
            header.base_string("https://some-endpoint.com/post"),
            "https://some-endpoint.com/post.someSubmissionId.someFormId.1583136171649"
        );
    }
}
