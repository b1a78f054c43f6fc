use glam::{Mat4, Vec4};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Fixed orthographic camera over the whole base-resolution screen.
///
/// World units are base pixels with the origin at the top-left and y growing
/// down. The surface is an integer multiple of the base resolution, so the
/// projection alone performs the upscale.
pub struct ScreenCamera {
    pub base_width: f32,
    pub base_height: f32,
}

impl ScreenCamera {
    pub fn new(base_width: u32, base_height: u32) -> Self {
        Self {
            base_width: base_width as f32,
            base_height: base_height as f32,
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.base_width, self.base_height, 0.0, -1.0, 1.0)
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
        }
    }

    /// Map a base-pixel point to normalised device coordinates.
    pub fn to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        let clip = self.view_proj() * Vec4::new(x, y, 0.0, 1.0);
        (clip.x / clip.w, clip.y / clip.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-5 && (a.1 - b.1).abs() < 1e-5
    }

    #[test]
    fn top_left_maps_to_upper_left_corner() {
        let camera = ScreenCamera::new(320, 200);
        assert!(close(camera.to_ndc(0.0, 0.0), (-1.0, 1.0)));
    }

    #[test]
    fn bottom_right_maps_to_lower_right_corner() {
        let camera = ScreenCamera::new(320, 200);
        assert!(close(camera.to_ndc(320.0, 200.0), (1.0, -1.0)));
    }

    #[test]
    fn game_area_boundary_sits_at_expected_height() {
        let camera = ScreenCamera::new(320, 200);
        // y = 144 is 72% of the way down: 1 - 2 * 0.72 = -0.44
        let (_, y) = camera.to_ndc(160.0, 144.0);
        assert!((y + 0.44).abs() < 1e-5);
    }
}
