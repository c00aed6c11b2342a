//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum used to classify every failure a consumer
//! can observe, whether the server answered or not.

use serde::Serialize;

/// エラー種別の列挙体
///
/// サーバーが返した HTTP ステータスに対応する分類と、
/// レスポンスが得られなかった場合のクライアント側の分類を定義します。
///
/// ## Notes
/// * `non_exhaustive` - 将来的に列挙子が追加される可能性があることを示す
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::from_status(404);
/// assert_eq!(kind, ErrorKind::NotFound);
/// assert_eq!(kind.status_code(), Some(404));
/// assert_eq!(ErrorKind::Network.status_code(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - Bad Request: リクエストが不正
    BadRequest,
    /// 401 - Unauthorized: 認証が必要
    Unauthorized,
    /// 403 - Forbidden: アクセス権限なし
    Forbidden,
    /// 404 - Not Found: リソースが見つからない
    NotFound,
    /// 408 - Request Timeout: サーバー側のタイムアウト
    RequestTimeout,
    /// 409 - Conflict: 現在の状態と競合
    Conflict,
    /// 422 - Unprocessable Entity: 処理不可能なエンティティ
    UnprocessableEntity,
    /// 429 - Too Many Requests: レート制限超過
    TooManyRequests,
    /// その他の 4xx
    ClientError,
    /// 500 - Internal Server Error: サーバー内部エラー
    InternalServerError,
    /// 503 - Service Unavailable: サービス利用不可
    ServiceUnavailable,
    /// その他の 5xx
    ServerError,
    /// 接続できない・レスポンスなし
    Network,
    /// クライアント側のタイムアウト予算を超過
    Timeout,
    /// トークンやレスポンスの形式が不正
    Decode,
    /// セッションが失効し、再ログインが必要
    SessionExpired,
}

impl ErrorKind {
    /// HTTP ステータスコードから分類を決定
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::from_status(401), ErrorKind::Unauthorized);
    /// assert_eq!(ErrorKind::from_status(418), ErrorKind::ClientError);
    /// assert_eq!(ErrorKind::from_status(502), ErrorKind::ServerError);
    /// ```
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::RequestTimeout,
            409 => ErrorKind::Conflict,
            422 => ErrorKind::UnprocessableEntity,
            429 => ErrorKind::TooManyRequests,
            500 => ErrorKind::InternalServerError,
            503 => ErrorKind::ServiceUnavailable,
            s if s >= 500 => ErrorKind::ServerError,
            _ => ErrorKind::ClientError,
        }
    }

    /// HTTP ステータスコードを取得
    ///
    /// クライアント側の分類や範囲指定の分類には固有のコードがないため `None` を返します。
    #[inline]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            ErrorKind::BadRequest => Some(400),
            ErrorKind::Unauthorized => Some(401),
            ErrorKind::Forbidden => Some(403),
            ErrorKind::NotFound => Some(404),
            ErrorKind::RequestTimeout => Some(408),
            ErrorKind::Conflict => Some(409),
            ErrorKind::UnprocessableEntity => Some(422),
            ErrorKind::TooManyRequests => Some(429),
            ErrorKind::InternalServerError => Some(500),
            ErrorKind::ServiceUnavailable => Some(503),
            ErrorKind::ClientError
            | ErrorKind::ServerError
            | ErrorKind::Network
            | ErrorKind::Timeout
            | ErrorKind::Decode
            | ErrorKind::SessionExpired => None,
        }
    }

    /// ユーザー向けの文字列表現を取得
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::RequestTimeout => "Request Timeout",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::UnprocessableEntity => "Unprocessable Entity",
            ErrorKind::TooManyRequests => "Too Many Requests",
            ErrorKind::ClientError => "Client Error",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
            ErrorKind::ServerError => "Server Error",
            ErrorKind::Network => "Network Error",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Decode => "Decode Error",
            ErrorKind::SessionExpired => "Session Expired",
        }
    }

    /// 一時的な障害かどうかを判定
    ///
    /// 再試行で回復する可能性のある分類は `true` を返します。
    #[inline]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network
                | ErrorKind::Timeout
                | ErrorKind::RequestTimeout
                | ErrorKind::TooManyRequests
                | ErrorKind::InternalServerError
                | ErrorKind::ServiceUnavailable
                | ErrorKind::ServerError
        )
    }

    /// サーバーがエラーを返したかどうか
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InternalServerError | ErrorKind::ServiceUnavailable | ErrorKind::ServerError
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
