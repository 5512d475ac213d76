use nalgebra::{vector, Vector3, Vector4};

/// R G B A, all channels in <0;1>
pub type RGBA = Vector4<f32>;

/// R G B, channels in <0;1>
pub type RGB = Vector3<f32>;

pub fn new(r: f32, g: f32, b: f32, a: f32) -> RGBA {
    vector![r, g, b, a]
}

pub fn zero() -> RGBA {
    vector![0.0, 0.0, 0.0, 0.0]
}

pub fn mono(v: f32, opacity: f32) -> RGBA {
    vector![v, v, v, opacity]
}

pub fn rgb(r: f32, g: f32, b: f32) -> RGB {
    vector![r, g, b]
}

/// Convert a <0;1> colour into buffer bytes
pub fn to_bytes(color: RGB) -> [u8; 3] {
    let c = color.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8);
    [c.x, c.y, c.z]
}

/// Convert buffer bytes back to a <0;1> colour
pub fn from_bytes(bytes: [u8; 3]) -> RGB {
    vector![bytes[0] as f32, bytes[1] as f32, bytes[2] as f32] / 255.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bytes_clamp() {
        assert_eq!(to_bytes(rgb(1.0, 0.0, 0.5)), [255, 0, 128]);
        assert_eq!(to_bytes(rgb(2.0, -1.0, 0.0)), [255, 0, 0]);
        assert_eq!(from_bytes([255, 0, 0]), rgb(1.0, 0.0, 0.0));
    }
}
