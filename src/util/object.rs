use crate::model::error::BrowseError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    AWS,
    GCS,
}

impl Provider {
    pub fn scheme(&self) -> &'static str {
        match self {
            Provider::AWS => "s3://",
            Provider::GCS => "gs://",
        }
    }
}

/// Returns the provider named by the address scheme, `None` for a bare bucket name.
pub fn parse_provider_from_uri(uri: &str) -> Result<Option<Provider>, BrowseError> {
    if uri.starts_with("s3://") {
        Ok(Some(Provider::AWS))
    } else if uri.starts_with("gs://") {
        Ok(Some(Provider::GCS))
    } else if uri.contains("://") {
        Err(BrowseError::InvalidConfig(format!(
            "failed to parse provider of: {}",
            uri
        )))
    } else {
        Ok(None)
    }
}

/// Splits `s3://bucket/some/key` (or a bare `bucket/some/key`) into bucket and key.
pub fn parse_object_uri(uri: &str) -> (&str, &str) {
    let rest = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    rest.split_once('/').unwrap_or((rest, ""))
}

pub fn format_object_uri(provider: Provider, bucket: &str, key: &str) -> String {
    format!("{}{}/{}", provider.scheme(), bucket, key)
}

/// Last non-empty segment of a key, used for short status text.
pub fn basename(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert!(matches!(parse_provider_from_uri("s3://bucket"), Ok(Some(Provider::AWS))));
        assert!(matches!(parse_provider_from_uri("gs://bucket"), Ok(Some(Provider::GCS))));
        assert!(matches!(parse_provider_from_uri("bucket"), Ok(None)));
        assert!(matches!(parse_provider_from_uri("ftp://bucket"), Err(_)));
    }

    #[test]
    fn test_parse_object_uri() {
        let cases = vec![
            ("s3://bucket", ("bucket", "")),
            ("s3://bucket/", ("bucket", "")),
            ("gs://bucket/a/b.txt", ("bucket", "a/b.txt")),
            ("bucket/reports/", ("bucket", "reports/")),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_object_uri(input), expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_format_object_uri() {
        assert_eq!(
            format_object_uri(Provider::AWS, "bucket", "a/b.txt"),
            "s3://bucket/a/b.txt"
        );
        assert_eq!(
            format_object_uri(Provider::GCS, "bucket", "a/b.txt"),
            "gs://bucket/a/b.txt"
        );
    }

    #[test]
    fn test_basename() {
        let cases = vec![
            ("reports/q1.csv", "q1.csv"),
            ("q1.csv", "q1.csv"),
            ("reports/2024/", "2024"),
        ];

        for (input, expected) in cases {
            assert_eq!(basename(input), expected, "failed for case: {}", input);
        }
    }
}
