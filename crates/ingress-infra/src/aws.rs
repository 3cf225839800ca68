use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Shared AWS SDK configuration from the default credential chain.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
