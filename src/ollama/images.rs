use std::error::Error;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageOutputFormat;

/// Normalizes arbitrary image bytes to PNG and returns the Base64 payload
/// expected by the `images` field of a generate request.
pub fn encode_image_base64_from_bytes(bytes: &[u8]) -> Result<String, Box<dyn Error>> {
    let image = image::load_from_memory(bytes)?;
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Png)?;
    Ok(STANDARD.encode(&buffer))
}

/// Reads an image file and encodes it with [`encode_image_base64_from_bytes`].
pub fn encode_image_file(path: &Path) -> Result<String, Box<dyn Error>> {
    let bytes = fs::read(path)
        .map_err(|err| format!("Failed to read image '{}': {err}", path.display()))?;
    encode_image_base64_from_bytes(&bytes)
        .map_err(|err| format!("Failed to encode image '{}': {err}", path.display()).into())
}
