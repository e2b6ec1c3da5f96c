//! Storage tier migration between warm, ultrawarm and cold.

use crate::common::AcknowledgedResp;
use crate::endpoint::{header_field, request};
use crate::Client;
use http::{HeaderMap, Method};
use opal_core::{params, Body, BuildError, Context, Endpoint, PathBuilder, Reply, Result};

/// Storage tier migration endpoints. Obtained from [`Client::tiers`].
#[derive(Debug, Clone, Copy)]
pub struct Tiers<'a> {
    pub(crate) client: &'a Client,
}

params! {
    /// Parameters of the migration requests.
    pub struct MigrationParams {}
}

/// `POST /_cold/migration/_warm`
#[derive(Debug, Default)]
pub struct ColdToWarmReq {
    /// `{"indices": "..."}` naming the cold indices to bring back.
    pub body: Body,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: MigrationParams,
}

impl Endpoint for ColdToWarmReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        request(
            Method::POST,
            "/_cold/migration/_warm",
            Some(self.body),
            &self.params,
            &self.header,
        )
    }

    header_field!();
}

/// `POST /_ultrawarm/migration/<index>/_cold`
#[derive(Debug, Default)]
pub struct UltrawarmToColdReq {
    /// Index to move.
    pub index: String,
    /// Extra headers.
    pub header: HeaderMap,
    /// Query parameters.
    pub params: MigrationParams,
}

impl Endpoint for UltrawarmToColdReq {
    fn to_request(self) -> std::result::Result<http::Request<Body>, BuildError> {
        let path = PathBuilder::new()
            .literal("_ultrawarm")
            .literal("migration")
            .part("index", &self.index)
            .literal("_cold")
            .build()?;
        request(Method::POST, &path, None, &self.params, &self.header)
    }

    header_field!();
}

impl Tiers<'_> {
    /// Move cold indices back to the warm tier.
    pub async fn cold_to_warm(
        &self,
        ctx: &Context,
        req: ColdToWarmReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }

    /// Move an ultrawarm index to cold storage.
    pub async fn ultrawarm_to_cold(
        &self,
        ctx: &Context,
        req: UltrawarmToColdReq,
    ) -> Result<Reply<AcknowledgedResp>> {
        self.client.perform_json(ctx, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_paths() {
        let request = ColdToWarmReq {
            body: Body::from(r#"{"indices":"logs-2023"}"#),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "/_cold/migration/_warm");

        let request = UltrawarmToColdReq {
            index: "logs-2023".into(),
            ..Default::default()
        }
        .to_request()
        .unwrap();
        assert_eq!(request.uri(), "/_ultrawarm/migration/logs-2023/_cold");

        let err = UltrawarmToColdReq::default().to_request().unwrap_err();
        assert!(matches!(err, BuildError::MissingPart("index")));
    }
}
