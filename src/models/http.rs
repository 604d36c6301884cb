//! HTTP检测器 (HTTP Detector)
//!
//! 将推理请求转发给旁路检测服务: 图像以base64编码的PNG随JSON载荷
//! 上送, 服务返回绝对像素框列表. 超时与非2xx响应表现为 `Err`.

use std::io::Cursor;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::{ChunkDetection, PromptDetector};
use crate::Bbox;

#[derive(Serialize)]
struct DetectRequest<'a> {
    image_b64: String,
    prompts: &'a [String],
    confidence: f32,
}

#[derive(Deserialize)]
struct WireDetection {
    #[serde(rename = "box")]
    bbox: [f32; 4],
    score: f32,
    label: usize,
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Vec<WireDetection>,
}

/// 旁路推理服务客户端
#[derive(Clone)]
pub struct HttpDetector {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpDetector {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .build();
        Self {
            agent,
            endpoint: endpoint.to_string(),
        }
    }

    fn encode_png(image: &DynamicImage) -> Result<String> {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, image::ImageFormat::Png)
            .context("failed to encode image payload")?;
        Ok(BASE64.encode(buf.into_inner()))
    }
}

impl PromptDetector for HttpDetector {
    fn detect(
        &self,
        image: &DynamicImage,
        prompts: &[String],
        confidence: f32,
    ) -> Result<Vec<ChunkDetection>> {
        let request = DetectRequest {
            image_b64: Self::encode_png(image)?,
            prompts,
            confidence,
        };

        let response: DetectResponse = self
            .agent
            .post(&self.endpoint)
            .send_json(&request)
            .with_context(|| format!("detector request to {} failed", self.endpoint))?
            .into_json()
            .context("detector returned malformed JSON")?;

        Ok(response
            .detections
            .into_iter()
            .map(|d| ChunkDetection {
                bbox: Bbox::new(d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]),
                score: d.score,
                label_offset: d.label,
            })
            .collect())
    }
}
