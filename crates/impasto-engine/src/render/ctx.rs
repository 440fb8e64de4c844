/// Presentation target for one frame (encoder + surface view + format).
pub struct SurfaceTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

impl<'a> SurfaceTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        view: &'a wgpu::TextureView,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self { encoder, view, format }
    }
}
