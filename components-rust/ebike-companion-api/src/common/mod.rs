use golem_rust::Schema;
use serde::{Deserialize, Serialize};

/// Author details copied onto posts and comments at creation time.
#[derive(Schema, Clone, Serialize, Deserialize)]
pub struct Author {
    pub user_id: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Identicon avatar derived from the rider's email, used until they upload one.
pub(crate) fn default_avatar(email: &str) -> String {
    let digest = md5::compute(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{digest:x}?d=identicon")
}

pub(crate) mod snapshot {
    use serde::{de, Serialize};

    pub const SERIALIZATION_VERSION_V1: u8 = 1u8;

    pub(crate) fn serialize<T>(value: &T) -> Result<Vec<u8>, String>
    where
        T: ?Sized + Serialize,
    {
        let data = serde_json::to_vec(value).map_err(|err| err.to_string())?;

        let mut result = vec![SERIALIZATION_VERSION_V1];
        result.extend(data);

        Ok(result)
    }

    pub(crate) fn deserialize<'a, T>(bytes: &'a [u8]) -> Result<T, String>
    where
        T: de::Deserialize<'a>,
    {
        match bytes.split_first() {
            Some((&SERIALIZATION_VERSION_V1, data)) => {
                serde_json::from_slice(data).map_err(|err| err.to_string())
            }
            Some((version, _)) => Err(format!("Unsupported serialization version: {version}")),
            None => Err("Empty snapshot".to_string()),
        }
    }
}
