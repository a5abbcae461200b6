//! 出荷データの型定義
//!
//! バックエンドのJSONスキーマは大半のフィールドが任意/null許容のため、
//! `_id` 以外はすべて Option で受ける。モデル化していないフィールドは
//! `extra` に保持し、更新（PUT）時にそのまま送り返す。

use crate::barcode::is_valid_code;
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 自社集荷（Flex）を表す logistic_type
pub const SELF_SERVICE: &str = "self_service";

/// 印刷待ちを表す substatus
pub const READY_TO_PRINT: &str = "ready_to_print";

/// 出荷ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(pub u64);

impl ShipmentId {
    /// スキャン値を出荷IDに変換
    ///
    /// 11桁の数字のみ受け付ける。
    pub fn parse(code: &str) -> Result<Self> {
        if !is_valid_code(code) {
            return Err(Error::InvalidIdentifier(code.to_string()));
        }
        code.parse::<u64>()
            .map(ShipmentId)
            .map_err(|_| Error::InvalidIdentifier(code.to_string()))
    }
}

impl std::fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// null を既定値として読む
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 梱包写真（アップロード済み）
///
/// サーバー側の値は `url` / `public_id` が null のこともある。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackedPhoto {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub public_id: String,
}

/// 出荷明細
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 物流区分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogisticsClass {
    /// 自社集荷（self_service）
    SelfManaged,
    /// それ以外の配送（値なしも含む）
    Dispatch(Option<String>),
}

/// 出荷レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    #[serde(rename = "_id")]
    pub id: ShipmentId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_nickname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substatus: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistic_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_items: Option<Vec<LineItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_items_photo: Option<PackedPhoto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packing_comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// 未モデル化フィールド（更新時にそのまま返送）
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShipmentRecord {
    /// IDのみの最小レコード
    pub fn new(id: ShipmentId) -> Self {
        Self {
            id,
            mode: None,
            order_id: None,
            buyer_nickname: None,
            status: None,
            substatus: None,
            tracking_number: None,
            sender_id: None,
            logistic_type: None,
            shipping_items: None,
            shipped_items_photo: None,
            comments: None,
            packing_comment: None,
            date_created: None,
            last_updated: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn logistics_class(&self) -> LogisticsClass {
        match self.logistic_type.as_deref() {
            Some(SELF_SERVICE) => LogisticsClass::SelfManaged,
            other => LogisticsClass::Dispatch(other.map(str::to_string)),
        }
    }

    pub fn items(&self) -> &[LineItem] {
        self.shipping_items.as_deref().unwrap_or_default()
    }

    pub fn has_photo(&self) -> bool {
        self.shipped_items_photo.is_some()
    }

    /// 梱包写真を添付したコピーを返す
    pub fn with_photo(&self, photo: PackedPhoto) -> Self {
        let mut updated = self.clone();
        updated.shipped_items_photo = Some(photo);
        updated
    }
}

/// 出荷検索条件（GET api/shipments のクエリ）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentQuery {
    pub tracking_number: Option<String>,
    pub status: Option<String>,
    pub statuses: Option<String>,
    pub order_id: Option<String>,
    pub sender_id: Option<u64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ShipmentQuery {
    /// 指定されたパラメータのみをクエリ文字列用のペアに変換
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                pairs.push((key, v));
            }
        };
        push("tracking_number", self.tracking_number.clone());
        push("status", self.status.clone());
        push("statuses", self.statuses.clone());
        push("order_id", self.order_id.clone());
        push("sender_id", self.sender_id.map(|v| v.to_string()));
        push("date_from", self.date_from.clone());
        push("date_to", self.date_to.clone());
        push("page", self.page.map(|v| v.to_string()));
        push("limit", self.limit.map(|v| v.to_string()));
        pairs
    }
}

/// ログイン/登録リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// ユーザー情報
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub roles: Option<Vec<String>>,
    pub permissions: Option<Vec<String>>,
    pub packer: Option<bool>,
    pub admin: Option<bool>,
}

/// 認証レスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthResponse {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
}
