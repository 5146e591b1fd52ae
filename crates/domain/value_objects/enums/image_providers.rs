use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageProvider {
    #[default]
    Dalle,
    Stability,
}

impl Display for ImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provider = match self {
            ImageProvider::Dalle => "dalle",
            ImageProvider::Stability => "stability",
        };
        write!(f, "{}", provider)
    }
}

impl TryFrom<&String> for ImageProvider {
    type Error = anyhow::Error;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dalle" => Ok(ImageProvider::Dalle),
            "stability" => Ok(ImageProvider::Stability),
            other => Err(anyhow::anyhow!("unknown image provider: {}", other)),
        }
    }
}
