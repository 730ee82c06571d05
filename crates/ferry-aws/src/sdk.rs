//! Shared SDK configuration.

use aws_config::{BehaviorVersion, Region, SdkConfig};

use ferry_core::Config;

/// Region and endpoint override only. No credentials; storage clients add
/// federated ones per connection.
pub(crate) fn sdk_config(config: &Config) -> SdkConfig {
    let mut builder = SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        builder = builder.endpoint_url(endpoint.as_str().trim_end_matches('/'));
    }

    builder.build()
}

#[cfg(test)]
pub(crate) fn test_config(endpoint: Option<&str>) -> Config {
    use ferry_core::config::{
        BUCKET, CLIENT_ID, ENDPOINT_URL, IDENTITY_POOL_ID, REGION, USER_POOL_ID,
    };

    let endpoint = endpoint.map(str::to_string);
    Config::from_lookup(move |name| match name {
        USER_POOL_ID => Some("eu-west-1_AbCdEf".to_string()),
        CLIENT_ID => Some("client123".to_string()),
        IDENTITY_POOL_ID => Some("eu-west-1:00000000-1111-2222-3333-444444444444".to_string()),
        REGION => Some("eu-west-1".to_string()),
        BUCKET => Some("my-files".to_string()),
        ENDPOINT_URL => endpoint.clone(),
        _ => None,
    })
    .expect("test configuration is complete")
}
