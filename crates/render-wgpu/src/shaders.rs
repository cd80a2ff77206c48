/// WGSL shader for instanced scene nodes (tiles, trees, the player).
pub const WORLD_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light = normalize(uniforms.light_dir.xyz);
    let ambient = uniforms.light_dir.w;
    let diffuse = max(dot(in.world_normal, light), 0.0);
    let lighting = ambient + diffuse * (1.0 - ambient);
    return vec4<f32>(in.color.rgb * uniforms.light_color.rgb * lighting, in.color.a);
}
"#;

/// WGSL shader for line gizmos (the world axes).
pub const LINE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_line(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// WGSL shader for terrain meshes: height-tinted, lit from screen-space
/// derivatives since the meshes carry positions only.
pub const TERRAIN_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct TerrainVertex {
    @location(0) position: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct TerrainOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_terrain(vertex: TerrainVertex, instance: InstanceInput) -> TerrainOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: TerrainOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.color = instance.color;
    return out;
}

@fragment
fn fs_terrain(in: TerrainOutput) -> @location(0) vec4<f32> {
    var normal = normalize(cross(dpdy(in.world_pos), dpdx(in.world_pos)));
    if (normal.y < 0.0) {
        normal = -normal;
    }

    let peak = vec3<f32>(0.93, 0.93, 0.96);
    let t = clamp(in.world_pos.y / max(uniforms.light_color.a, 0.001), 0.0, 1.0);
    let base = mix(in.color.rgb, peak, t);

    let light = normalize(uniforms.light_dir.xyz);
    let ambient = uniforms.light_dir.w;
    let diffuse = max(dot(normal, light), 0.0);
    let lighting = ambient + diffuse * (1.0 - ambient);
    return vec4<f32>(base * uniforms.light_color.rgb * lighting, in.color.a);
}
"#;
