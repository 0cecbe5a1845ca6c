// ABOUTME: ACM certificate listing and STS caller identity.
// ABOUTME: Certificates are always read from us-east-1, where CloudFront looks for them.

use async_trait::async_trait;
use serde::Deserialize;

use super::{AwsCli, CERTIFICATE_REGION};
use crate::cloud::{Certificate, CertificateOps, CloudError, IdentityOps};
use crate::types::CertificateArn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertificatesResponse {
    #[serde(default)]
    certificate_summary_list: Vec<CertificateSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CertificateSummary {
    certificate_arn: String,
    domain_name: String,
    #[serde(default)]
    subject_alternative_name_summaries: Vec<String>,
    #[serde(default)]
    status: Option<String>,
}

impl From<CertificateSummary> for Certificate {
    fn from(summary: CertificateSummary) -> Self {
        Certificate {
            arn: CertificateArn::new(summary.certificate_arn),
            domain_name: summary.domain_name,
            subject_alternative_names: summary.subject_alternative_name_summaries,
            status: summary.status.unwrap_or_else(|| "UNKNOWN".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    arn: String,
}

#[async_trait]
impl CertificateOps for AwsCli {
    async fn list_certificates(&self) -> Result<Vec<Certificate>, CloudError> {
        let response: CertificatesResponse = self
            .call_json(
                "acm list-certificates",
                &["acm", "list-certificates"],
                Some(CERTIFICATE_REGION),
            )
            .await?;
        Ok(response
            .certificate_summary_list
            .into_iter()
            .map(Certificate::from)
            .collect())
    }
}

#[async_trait]
impl IdentityOps for AwsCli {
    async fn caller_identity(&self) -> Result<String, CloudError> {
        let identity: CallerIdentity = self
            .call_json("sts get-caller-identity", &["sts", "get-caller-identity"], None)
            .await?;
        Ok(identity.arn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_summary_maps_sans() {
        let response: CertificatesResponse = serde_json::from_str(
            r#"{"CertificateSummaryList":[{"CertificateArn":"arn:aws:acm:us-east-1:1:certificate/a","DomainName":"example.com","SubjectAlternativeNameSummaries":["example.com","www.example.com"],"Status":"ISSUED"}]}"#,
        )
        .unwrap();
        let cert = Certificate::from(response.certificate_summary_list.into_iter().next().unwrap());
        assert!(cert.is_issued());
        assert!(cert.covered_domains().contains("www.example.com"));
    }
}
