use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

pub const USER_HEADER: &str = "user";

/// `User` 请求头中的调用者身份。
///
/// 按原始字节以 UTF-8 解码，带重音的名字也能识别；缺失或非法编码时为 `None`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserHeader(pub Option<String>);

impl<S> FromRequestParts<S> for UserHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .map(str::to_owned);
        Ok(UserHeader(identity))
    }
}
