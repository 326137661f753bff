//! Log-out route handler that invalidates the authentication cookie.

use axum::{http::StatusCode, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;

use crate::auth::cookie::invalidate_auth_cookie;

/// Invalidate the auth cookie and respond with 204 No Content.
///
/// Bearer tokens are stateless and stay valid until they expire.
pub async fn post_log_out(jar: PrivateCookieJar) -> impl IntoResponse {
    (StatusCode::NO_CONTENT, invalidate_auth_cookie(jar))
}

#[cfg(test)]
mod log_out_tests {
    use axum::{
        http::{StatusCode, header::SET_COOKIE},
        response::IntoResponse,
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{
        UserID,
        auth::{
            cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, set_auth_cookie},
            log_out::post_log_out,
        },
    };

    #[tokio::test]
    async fn log_out_invalidates_auth_cookie() {
        let key = Key::from(&Sha512::digest("42"));
        let cookie_jar =
            set_auth_cookie(PrivateCookieJar::new(key), UserID::new(123), DEFAULT_COOKIE_DURATION)
                .unwrap();

        let response = post_log_out(cookie_jar).await.into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|header| Cookie::parse(header.to_str().ok()?.to_owned()).ok())
            .find(|cookie| cookie.name() == COOKIE_TOKEN)
            .expect("auth cookie not set in response");

        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
