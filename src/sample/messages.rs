use serde::{Deserialize, Serialize};

use crate::task::TaskPayload;

/// Passage used when no sample item can be fetched
pub const DEFAULT_PASSAGE: &str = "Sample text to read aloud for testing.";

/// Item to read or describe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleItem {
    pub title: String,
    pub description: String,
    #[serde(rename = "images", default)]
    pub image_refs: Vec<String>,
}

impl SampleItem {
    /// Fixed fallback item
    pub fn fallback() -> Self {
        Self {
            title: "Sample item".to_string(),
            description: DEFAULT_PASSAGE.to_string(),
            image_refs: Vec::new(),
        }
    }

    /// TextReading payload: the description is the passage
    pub fn passage_payload(&self) -> TaskPayload {
        TaskPayload::passage(self.description.clone())
    }

    /// ImageDescription payload: the first image, if any
    pub fn image_payload(&self) -> TaskPayload {
        TaskPayload::image(self.image_refs.first().cloned())
    }
}

/// Product listing returned by the sample endpoint
#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct Product {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl From<Product> for SampleItem {
    fn from(product: Product) -> Self {
        let image_refs = if product.images.is_empty() {
            product.thumbnail.into_iter().collect()
        } else {
            product.images
        };

        Self {
            title: product.title,
            description: product.description,
            image_refs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_products_response() {
        let body = r#"{
            "products": [
                {"id": 1, "title": "Mascara", "description": "Long lashes.",
                 "images": ["https://cdn.example/1.png"], "thumbnail": "https://cdn.example/t.png"}
            ],
            "total": 1
        }"#;

        let response: ProductsResponse = serde_json::from_str(body).unwrap();
        let item = SampleItem::from(response.products.into_iter().next().unwrap());

        assert_eq!(item.title, "Mascara");
        assert_eq!(item.image_refs, vec!["https://cdn.example/1.png".to_string()]);
    }

    #[test]
    fn test_thumbnail_used_when_no_images() {
        let product: Product = serde_json::from_str(
            r#"{"title": "Lamp", "description": "Bright.", "thumbnail": "t.png"}"#,
        )
        .unwrap();

        let item = SampleItem::from(product);
        assert_eq!(item.image_payload().image_ref.as_deref(), Some("t.png"));
    }

    #[test]
    fn test_fallback_payloads() {
        let item = SampleItem::fallback();
        assert_eq!(item.passage_payload().text.as_deref(), Some(DEFAULT_PASSAGE));
        assert_eq!(item.image_payload().image_ref, None);
    }
}
