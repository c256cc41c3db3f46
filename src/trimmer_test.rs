#[cfg(test)]
mod tests {
    use super::super::*;
    use image::{ColorType, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    const BACKGROUND: Rgba<u8> = Rgba([40, 40, 40, 255]);
    const PAGE: Rgba<u8> = Rgba([250, 248, 240, 255]);

    /// Frame with a page-colored block spanning `x_range` on every row
    fn frame_with_page(width: u32, height: u32, x_range: std::ops::Range<u32>) -> DynamicImage {
        let image = RgbaImage::from_fn(width, height, |x, _| {
            if x_range.contains(&x) { PAGE } else { BACKGROUND }
        });
        DynamicImage::ImageRgba8(image)
    }

    #[test]
    fn test_bounds_follow_probe_row() {
        let frame = frame_with_page(300, 200, 50..250);
        let bounds = ImageTrimmer::new().bounds(&frame);
        assert_eq!(
            bounds,
            TrimBounds {
                start_x: 50,
                end_x: 250,
                height: 200
            }
        );

        let trimmed = ImageTrimmer::new().trim(&frame);
        assert_eq!(trimmed.dimensions(), (200, 200));
    }

    #[test]
    fn test_gradient_edges_are_background() {
        // Edge columns change color per row; the page is only on the probe row's middle
        let image = RgbaImage::from_fn(120, 150, |x, y| {
            if y == PROBE_ROW && (30..90).contains(&x) {
                PAGE
            } else {
                Rgba([y as u8, y as u8, 0, 255])
            }
        });
        let frame = DynamicImage::ImageRgba8(image);
        let bounds = ImageTrimmer::new().bounds(&frame);
        assert_eq!((bounds.start_x, bounds.end_x), (30, 90));
    }

    #[test]
    fn test_no_content_keeps_full_frame() {
        let frame = frame_with_page(64, 128, 0..0);
        let bounds = ImageTrimmer::with_chrome_margin(58).bounds(&frame);
        assert_eq!(
            bounds,
            TrimBounds {
                start_x: 0,
                end_x: 64,
                height: 128
            }
        );
    }

    #[test]
    fn test_retrimming_does_not_shrink() {
        let trimmer = ImageTrimmer::new();
        let once = trimmer.trim(&frame_with_page(300, 200, 40..260));
        let twice = trimmer.trim(&once);
        assert_eq!(once.dimensions(), (220, 200));
        assert_eq!(twice.dimensions(), once.dimensions());
        assert_eq!(twice.to_rgba8(), once.to_rgba8());
    }

    #[test]
    fn test_chrome_margin_applied_inside_detected_edges() {
        let frame = frame_with_page(400, 200, 80..320);
        let bounds = ImageTrimmer::with_chrome_margin(58).bounds(&frame);
        assert_eq!((bounds.start_x, bounds.end_x), (138, 262));
    }

    #[test]
    fn test_chrome_margin_skipped_when_it_would_invert_bounds() {
        let frame = frame_with_page(400, 200, 150..250);
        let bounds = ImageTrimmer::with_chrome_margin(58).bounds(&frame);
        assert_eq!((bounds.start_x, bounds.end_x), (150, 250));
    }

    #[test]
    fn test_short_frames_probe_last_row() {
        let frame = frame_with_page(50, 10, 10..20);
        let bounds = ImageTrimmer::new().bounds(&frame);
        assert_eq!((bounds.start_x, bounds.end_x), (10, 20));

        let tiny = DynamicImage::ImageRgba8(RgbaImage::new(1, 1));
        assert_eq!(ImageTrimmer::new().trim(&tiny).dimensions(), (1, 1));

        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert_eq!(ImageTrimmer::new().bounds(&empty).width(), 0);
    }

    #[test]
    fn test_normalize_for_output_format() {
        let frame = frame_with_page(10, 10, 2..8);
        assert_eq!(
            normalize_for(frame.clone(), ImageFormat::Jpeg).color(),
            ColorType::Rgb8
        );
        assert_eq!(
            normalize_for(frame, ImageFormat::Png).color(),
            ColorType::Rgba8
        );
    }
}
