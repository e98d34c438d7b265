pub type Rgb = (u8, u8, u8);

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

/// Format RGB as a lowercase `#rrggbb` string.
pub fn hex_css((r, g, b): Rgb) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::{hex_css, rgba_css};

    #[test]
    fn rgba_css_keeps_alpha_verbatim() {
        assert_eq!(rgba_css(51, 136, 255, 0.1), "rgba(51,136,255,0.1)");
        assert_eq!(rgba_css(0, 0, 0, 1.0), "rgba(0,0,0,1)");
    }

    #[test]
    fn hex_css_pads_channels() {
        assert_eq!(hex_css((255, 165, 0)), "#ffa500");
        assert_eq!(hex_css((0, 8, 128)), "#000880");
    }
}
