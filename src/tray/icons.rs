//! Icon generation for the system tray
//!
//! The tray icon is generated programmatically (a small sun glyph) so the
//! binary needs no icon asset on disk.

use image::{ImageBuffer, Rgba};

pub const ICON_SIZE: u32 = 16;

const SUN: (u8, u8, u8) = (255, 184, 28);

/// Draw a 16x16 sun: a filled disc with eight short rays.
pub fn sun_icon() -> ImageBuffer<Rgba<u8>, Vec<u8>> {
    let mut img = ImageBuffer::new(ICON_SIZE, ICON_SIZE);

    let center = (ICON_SIZE - 1) as f32 / 2.0;
    let disc_radius = 4.0;
    let ray_inner = 5.5;
    let ray_outer = 7.5;

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let distance = (dx * dx + dy * dy).sqrt();

        let on_disc = distance <= disc_radius;

        // Rays sit on the 45-degree spokes and the axes
        let angle = dy.atan2(dx);
        let spoke = (angle / std::f32::consts::FRAC_PI_4).round() * std::f32::consts::FRAC_PI_4;
        let on_spoke = (angle - spoke).abs() < 0.18;
        let on_ray = on_spoke && distance >= ray_inner && distance <= ray_outer;

        if on_disc || on_ray {
            *pixel = Rgba([SUN.0, SUN.1, SUN.2, 255]);
        } else {
            *pixel = Rgba([0, 0, 0, 0]); // Transparent background
        }
    }

    img
}

/// Generate the icon as RGBA bytes for tray-icon
pub fn sun_icon_bytes() -> Vec<u8> {
    sun_icon().into_raw()
}
