use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::Client as S3Client;

/// Object storage for profile pictures (MinIO, S3 protocol).
#[derive(Clone)]
pub struct MinioClient {
    client: S3Client,
    bucket: String,
    public_url: String,
}

impl MinioClient {
    pub async fn new(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_url: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "lancer-minio");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();
        let client = S3Client::from_conf(config);

        if let Err(e) = client.create_bucket().bucket(bucket).send().await {
            tracing::debug!(bucket = %bucket, error = %e, "create_bucket skipped");
        }
        tracing::info!(endpoint = %endpoint, bucket = %bucket, "object storage ready");

        Self {
            client,
            bucket: bucket.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Stores `body` under `key` and returns the object's public URL.
    pub async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, String> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body.into())
            .send()
            .await
            .map_err(|e| format!("upload failed: {e}"))?;

        tracing::debug!(key = %key, size, "object stored");
        Ok(self.public_url_for(key))
    }

    pub async fn delete(&self, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("delete failed: {e}"))?;
        Ok(())
    }

    pub fn public_url_for(&self, key: &str) -> String {
        public_url(&self.public_url, &self.bucket, key)
    }

    /// The object key behind one of our public URLs, or `None` for foreign URLs.
    pub fn key_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        key_for_url(&self.public_url, &self.bucket, url)
    }
}

fn public_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{base}/{bucket}/{key}")
}

fn key_for_url<'a>(base: &str, bucket: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix(base)?
        .strip_prefix('/')?
        .strip_prefix(bucket)?
        .strip_prefix('/')
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips_through_public_url() {
        let url = public_url("http://cdn.local", "lancer-profiles", "profiles/u1/a.png");
        assert_eq!(url, "http://cdn.local/lancer-profiles/profiles/u1/a.png");
        assert_eq!(
            key_for_url("http://cdn.local", "lancer-profiles", &url),
            Some("profiles/u1/a.png")
        );
    }

    #[test]
    fn foreign_urls_have_no_key() {
        let base = "http://cdn.local";
        assert_eq!(key_for_url(base, "lancer-profiles", "https://lh3.googleusercontent.com/a.jpg"), None);
        assert_eq!(key_for_url(base, "lancer-profiles", "http://cdn.local/other-bucket/a.jpg"), None);
        assert_eq!(key_for_url(base, "lancer-profiles", "http://cdn.local/lancer-profiles/"), None);
    }
}
