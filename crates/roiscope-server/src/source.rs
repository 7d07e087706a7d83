//! Synthetic camera frames.

use std::sync::Arc;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageError, Rgb, RgbImage};
use roiscope_core::protocol::{ChannelId, StreamMessage, encode_image};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::relay::RelayState;

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 360;
const BAR_WIDTH: u32 = 40;

/// Timestamp format used on every outbound message.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn tint(channel_id: ChannelId) -> Rgb<u8> {
    const PALETTE: [[u8; 3]; 4] = [[40, 60, 90], [60, 90, 40], [90, 40, 60], [80, 80, 30]];
    Rgb(PALETTE[channel_id.rem_euclid(PALETTE.len() as i64) as usize])
}

/// Channel-tinted test pattern with a bar sweeping left to right.
pub fn render_pattern(channel_id: ChannelId, tick: u64, width: u32, height: u32) -> RgbImage {
    let background = tint(channel_id);
    let span = width.max(1) as u64;
    let bar_x = ((tick * 8) % span) as u32;
    RgbImage::from_fn(width, height, |x, y| {
        if x >= bar_x && x < bar_x + BAR_WIDTH {
            Rgb([230, 230, 230])
        } else if (x / 40 + y / 40) % 2 == 0 {
            background
        } else {
            Rgb([background[0] / 2, background[1] / 2, background[2] / 2])
        }
    })
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).encode_image(image)?;
    Ok(buffer)
}

/// Publish synthetic frames for every configured channel until the runtime
/// shuts down.
pub async fn run(state: Arc<RelayState>, config: ServerConfig) {
    let period = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let alert_every = alert_every_ticks(&config);
    info!(
        "Synthetic source: channels {:?} at {} fps",
        config.channels, config.fps
    );

    let mut tick: u64 = 0;
    loop {
        ticker.tick().await;
        tick += 1;

        for &channel_id in &config.channels {
            if !state.has_subscribers(channel_id) {
                continue;
            }
            let image = render_pattern(channel_id, tick, FRAME_WIDTH, FRAME_HEIGHT);
            match encode_jpeg(&image, config.jpeg_quality) {
                Ok(jpeg) => {
                    state.publish_frame(channel_id, &jpeg, timestamp());
                }
                Err(e) => warn!("Channel {}: JPEG encode failed: {}", channel_id, e),
            }
        }

        if let Some(every) = alert_every {
            if tick % every == 0 {
                if let Some(alert) = synthetic_alert(&config, tick) {
                    state.publish_alert(&alert);
                }
            }
        }
    }
}

/// Ticks between synthetic alerts, if alerts are configured.
fn alert_every_ticks(config: &ServerConfig) -> Option<u64> {
    config
        .alert_interval_secs
        .map(|secs| secs.saturating_mul(config.fps as u64).max(1))
}

fn synthetic_alert(config: &ServerConfig, tick: u64) -> Option<StreamMessage> {
    let channel_id = *config.channels.get(tick as usize % config.channels.len().max(1))?;
    let image = render_pattern(channel_id, tick, FRAME_WIDTH / 2, FRAME_HEIGHT / 2);
    let jpeg = encode_jpeg(&image, config.jpeg_quality).ok()?;
    Some(StreamMessage::Alert {
        channel_id,
        channel_name: format!("Channel {}", channel_id),
        alert_type: "intrusion".to_string(),
        confidence: 0.9,
        detected_objects: r#"[{"class":"person","confidence":0.9}]"#.to_string(),
        image_base64: encode_image(&jpeg),
        timestamp: Some(timestamp()),
    })
}
