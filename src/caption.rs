use tracing::{info, warn};

pub const EMPTY_CAPTION: &str = "No description could be generated for this frame.";
pub const DECLINED_CAPTION: &str = "Model could not process the image as requested.";

const DECLINE_MARKERS: [&str; 2] = ["Sorry, I can't", "I am unable to"];

/// Rewrites an empty model answer or a refusal into a fixed caption.
pub fn refine_caption(raw: &str, prompt: &str) -> String {
    let caption = raw.trim();

    if caption.is_empty() {
        warn!("Model returned an empty caption");
        return EMPTY_CAPTION.to_string();
    }

    if DECLINE_MARKERS.iter().any(|marker| caption.contains(marker)) {
        info!("Model could not process the image with prompt {prompt:?}: {caption}");
        return DECLINED_CAPTION.to_string();
    }

    caption.to_string()
}
