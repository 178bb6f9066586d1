use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid token.")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A collaborator failed; `0` names the action the caller attempted.
    #[error("Unable to {0} at the moment")]
    Unavailable(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a domain failure of `action` (e.g. "fetch cart") to a response.
    pub fn from_domain(action: &'static str) -> impl Fn(DomainError) -> AppError {
        move |e| match e {
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::Unavailable(msg) | DomainError::Conflict(msg) => {
                log::error!("Unable to {}: {}", action, msg);
                AppError::Unavailable(action)
            }
            DomainError::Corrupted(msg) => {
                log::error!("Unable to {}, stored cart is corrupted: {}", action, msg);
                AppError::Internal(msg)
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": msg
            })),
            AppError::Unavailable(action) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "description": format!(
                        "Unable to {} at the moment. Please try again later.",
                        action
                    )
                }))
            }
            AppError::Internal(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn unauthorized_returns_401() {
        assert_eq!(
            AppError::Unauthorized.error_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn bad_request_returns_400() {
        let err = AppError::BadRequest("quantity".to_string());
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn unavailable_returns_500_with_fallback_description() {
        let resp = AppError::Unavailable("fetch cart").error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["description"],
            "Unable to fetch cart at the moment. Please try again later."
        );
    }

    #[test]
    fn domain_invalid_input_maps_to_bad_request() {
        let app_err = AppError::from_domain("add product to cart")(DomainError::InvalidInput(
            "bad value".to_string(),
        ));
        assert!(matches!(app_err, AppError::BadRequest(_)));
    }

    #[test]
    fn domain_unavailable_and_conflict_map_to_unavailable() {
        let map = AppError::from_domain("delete cart");
        assert!(matches!(
            map(DomainError::Unavailable("db down".to_string())),
            AppError::Unavailable("delete cart")
        ));
        assert!(matches!(
            map(DomainError::Conflict("u1".to_string())),
            AppError::Unavailable("delete cart")
        ));
    }

    #[test]
    fn domain_corruption_maps_to_internal() {
        let app_err = AppError::from_domain("fetch cart")(DomainError::Corrupted("P1".to_string()));
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
