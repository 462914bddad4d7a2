/// Offscreen colour + depth attachments the wgpu backend renders into.
///
/// The single-sample colour texture is always created: with MSAA it is the
/// resolve target, and in every case it is the texture
/// [`WgpuContext::capture_frame`](super::WgpuContext::capture_frame) copies
/// back to the CPU.

/// Descriptor for a 2-D render-attachment texture.
struct AttachmentDesc<'a> {
    label: &'a str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    sample_count: u32,
    usage: wgpu::TextureUsages,
}

fn create_attachment(
    device: &wgpu::Device,
    desc: &AttachmentDesc<'_>,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(desc.label),
        size: wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: desc.sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: desc.format,
        usage: desc.usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

pub struct RenderTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    /// Multisampled colour texture (present only when `sample_count > 1`).
    msaa_view: Option<wgpu::TextureView>,
    pub depth_view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    /// Unorm rather than sRGB: clear colours and vertex colours are written
    /// as given.
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, width: u32, height: u32, sample_count: u32) -> Self {
        let format = Self::COLOR_FORMAT;
        let (color, color_view) = create_attachment(
            device,
            &AttachmentDesc {
                label: "conic colour target",
                width,
                height,
                format,
                sample_count: 1,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            },
        );
        let msaa_view = (sample_count > 1).then(|| {
            create_attachment(
                device,
                &AttachmentDesc {
                    label: "conic colour target (msaa)",
                    width,
                    height,
                    format,
                    sample_count,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                },
            )
            .1
        });
        // depth sample count must match the colour attachment's
        let (_, depth_view) = create_attachment(
            device,
            &AttachmentDesc {
                label: "conic depth target",
                width,
                height,
                format: Self::DEPTH_FORMAT,
                sample_count,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            },
        );

        Self {
            color,
            color_view,
            msaa_view,
            depth_view,
            format,
            sample_count,
            width,
            height,
        }
    }

    /// Returns `(render_view, resolve_target)` for a colour attachment.
    pub fn attachment_views(&self) -> (&wgpu::TextureView, Option<&wgpu::TextureView>) {
        match &self.msaa_view {
            Some(msaa) => (msaa, Some(&self.color_view)),
            None => (&self.color_view, None),
        }
    }
}
