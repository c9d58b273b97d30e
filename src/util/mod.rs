pub type Rgba = rgb::RGBA<f32>;
