use auraform::core::color::Rgb;
use auraform::core::reactivity::Transform;
use auraform::FrameView;
use egui::{Color32, Mesh, Painter, Pos2, Rect, Shape, Vec2};

const AURA_ALPHA: u8 = 48;
const CAMERA_DISTANCE: f32 = 3.5;
const POINT_PX: f32 = 1.6;

/// Perspective projection of a world point onto `rect`, returning the
/// screen position and a depth factor for point sizing.
fn project(p: [f32; 3], rect: Rect, world_radius: f32) -> Option<(Pos2, f32)> {
    let cam = world_radius * CAMERA_DISTANCE;
    let depth = cam - p[2];
    if depth <= world_radius * 0.1 {
        return None;
    }
    let persp = cam / depth;
    let px_per_unit = rect.width().min(rect.height()) / (world_radius * 4.0);
    let c = rect.center();
    let pos = Pos2::new(
        c.x + p[0] * persp * px_per_unit,
        c.y - p[1] * persp * px_per_unit,
    );
    rect.contains(pos).then_some((pos, persp))
}

fn to_color32(c: [f32; 3], alpha: u8) -> Color32 {
    let [r, g, b] = Rgb::from_array(c).to_u8();
    Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

fn push_points(
    mesh: &mut Mesh,
    positions: &[f32],
    color_at: impl Fn(usize) -> Color32,
    xf: &Transform,
    rect: Rect,
    world_radius: f32,
) {
    for (i, p) in positions.chunks_exact(3).enumerate() {
        let world = xf.apply([p[0], p[1], p[2]]);
        let Some((pos, persp)) = project(world, rect, world_radius) else {
            continue;
        };
        let side = POINT_PX * persp;
        mesh.add_colored_rect(Rect::from_center_size(pos, Vec2::splat(side)), color_at(i));
    }
}

/// Paints the aura behind the core cloud, both as one mesh.
pub fn paint_cloud(painter: &Painter, rect: Rect, view: &FrameView<'_>, world_radius: f32) {
    painter.rect_filled(rect, 0.0, Color32::BLACK);
    let mut mesh = Mesh::default();

    let aura = to_color32(view.aura_color.to_array(), AURA_ALPHA);
    push_points(
        &mut mesh,
        view.aura_positions,
        |_| aura,
        &view.aura,
        rect,
        world_radius,
    );

    let colors = view.colors;
    push_points(
        &mut mesh,
        view.positions,
        |i| to_color32([colors[i * 3], colors[i * 3 + 1], colors[i * 3 + 2]], 255),
        &view.core,
        rect,
        world_radius,
    );

    painter.add(Shape::mesh(mesh));
}

/// Pointer position inside `rect` normalized to `[-1, 1]`, y up.
pub fn normalized_pointer(pos: Option<Pos2>, rect: Rect) -> Option<[f32; 2]> {
    let pos = pos.filter(|p| rect.contains(*p))?;
    let half = rect.size() * 0.5;
    if half.x <= 0.0 || half.y <= 0.0 {
        return None;
    }
    let d = pos - rect.center();
    Some([d.x / half.x, -d.y / half.y])
}
