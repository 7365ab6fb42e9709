// eval/compiled.rs — Density kinds and pre-resolved input handles
//
// At graph construction every node's type string becomes a `DensityKind` and
// every incoming edge's handle string becomes either a fixed named slot or a
// position in the node's sorted `Inputs[N]` list. Evaluation then never
// touches a string.

use smallvec::SmallVec;

// ── Density kinds ───────────────────────────────────────────────────

/// Every density node type the evaluator knows how to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DensityKind {
    // constants
    Constant,
    Zero,
    One,
    SwitchState,
    // coordinates
    CoordinateX,
    CoordinateY,
    CoordinateZ,
    DistanceFromOrigin,
    DistanceFromAxis,
    DistanceFromPoint,
    AngleFromOrigin,
    AngleFromPoint,
    YGradient,
    BaseHeight,
    // noise
    SimplexNoise2D,
    SimplexNoise3D,
    SimplexRidgeNoise2D,
    SimplexRidgeNoise3D,
    FractalNoise2D,
    FractalNoise3D,
    VoronoiNoise2D,
    VoronoiNoise3D,
    DomainWarp2D,
    DomainWarp3D,
    Positions3D,
    PositionsCellNoise,
    // unary arithmetic
    Negate,
    Abs,
    SquareRoot,
    CubeRoot,
    Square,
    Cube,
    Inverse,
    SumSelf,
    Modulo,
    AmplitudeConstant,
    Pow,
    LinearTransform,
    Floor,
    Ceiling,
    // combinators
    Sum,
    Product,
    WeightedSum,
    MinFunction,
    MaxFunction,
    AverageFunction,
    Interpolate,
    Blend,
    BlendCurve,
    Offset,
    Amplitude,
    // ranges and selection
    Clamp,
    ClampToIndex,
    Normalizer,
    DoubleNormalizer,
    RangeChoice,
    Conditional,
    Switch,
    // smooth operators
    SmoothMin,
    SmoothMax,
    SmoothClamp,
    SmoothFloor,
    SmoothCeiling,
    // position transforms
    TranslatedPosition,
    ScaledPosition,
    RotatedPosition,
    MirroredPosition,
    QuantizedPosition,
    XOverride,
    YOverride,
    ZOverride,
    Anchor,
    YSampled,
    PositionsPinch,
    PositionsTwist,
    GradientWarp,
    // curves
    CurveFunction,
    SplineFunction,
    Distance,
    // shapes
    Ellipsoid,
    Cuboid,
    Cylinder,
    Plane,
    Shell,
    // caching and pass-through
    CacheOnce,
    Passthrough,
    /// Needs world context the preview does not have; evaluates to 0.
    ContextDependent,
}

impl DensityKind {
    /// Map a node type name to its kind. `None` for anything that is not a
    /// density node (curves, materials, the `Root` sink, typos).
    pub fn from_type_name(name: &str) -> Option<DensityKind> {
        use DensityKind::*;
        let kind = match name {
            "Constant" => Constant,
            "Zero" => Zero,
            "One" => One,
            "SwitchState" => SwitchState,

            "CoordinateX" => CoordinateX,
            "CoordinateY" => CoordinateY,
            "CoordinateZ" => CoordinateZ,
            "DistanceFromOrigin" => DistanceFromOrigin,
            "DistanceFromAxis" => DistanceFromAxis,
            "DistanceFromPoint" => DistanceFromPoint,
            "AngleFromOrigin" => AngleFromOrigin,
            "AngleFromPoint" => AngleFromPoint,
            "YGradient" | "GradientDensity" | "Gradient" => YGradient,
            "BaseHeight" => BaseHeight,

            "SimplexNoise2D" => SimplexNoise2D,
            "SimplexNoise3D" => SimplexNoise3D,
            "SimplexRidgeNoise2D" => SimplexRidgeNoise2D,
            "SimplexRidgeNoise3D" => SimplexRidgeNoise3D,
            "FractalNoise2D" => FractalNoise2D,
            "FractalNoise3D" => FractalNoise3D,
            "VoronoiNoise2D" => VoronoiNoise2D,
            "VoronoiNoise3D" => VoronoiNoise3D,
            "DomainWarp2D" => DomainWarp2D,
            "DomainWarp3D" => DomainWarp3D,
            "Positions3D" => Positions3D,
            "PositionsCellNoise" => PositionsCellNoise,

            "Negate" => Negate,
            "Abs" => Abs,
            "SquareRoot" => SquareRoot,
            "CubeRoot" => CubeRoot,
            "Square" => Square,
            "Cube" | "CubeMath" => Cube,
            "Inverse" => Inverse,
            "SumSelf" => SumSelf,
            "Modulo" => Modulo,
            "AmplitudeConstant" => AmplitudeConstant,
            "Pow" => Pow,
            "LinearTransform" => LinearTransform,
            "Floor" => Floor,
            "Ceiling" => Ceiling,

            "Sum" => Sum,
            "Product" => Product,
            "WeightedSum" => WeightedSum,
            "MinFunction" => MinFunction,
            "MaxFunction" => MaxFunction,
            "AverageFunction" => AverageFunction,
            "Interpolate" => Interpolate,
            "Blend" => Blend,
            "BlendCurve" => BlendCurve,
            "Offset" => Offset,
            "Amplitude" => Amplitude,

            "Clamp" => Clamp,
            "ClampToIndex" => ClampToIndex,
            "Normalizer" => Normalizer,
            "DoubleNormalizer" => DoubleNormalizer,
            "RangeChoice" => RangeChoice,
            "Conditional" => Conditional,
            "Switch" => Switch,

            "SmoothMin" => SmoothMin,
            "SmoothMax" => SmoothMax,
            "SmoothClamp" => SmoothClamp,
            "SmoothFloor" => SmoothFloor,
            "SmoothCeiling" => SmoothCeiling,

            "TranslatedPosition" => TranslatedPosition,
            "ScaledPosition" => ScaledPosition,
            "RotatedPosition" => RotatedPosition,
            "MirroredPosition" => MirroredPosition,
            "QuantizedPosition" => QuantizedPosition,
            "XOverride" => XOverride,
            "YOverride" => YOverride,
            "ZOverride" => ZOverride,
            "Anchor" => Anchor,
            "YSampled" => YSampled,
            "PositionsPinch" => PositionsPinch,
            "PositionsTwist" => PositionsTwist,
            "GradientWarp" => GradientWarp,

            "CurveFunction" => CurveFunction,
            "SplineFunction" => SplineFunction,
            "Distance" => Distance,

            "Ellipsoid" => Ellipsoid,
            "Cuboid" => Cuboid,
            "Cylinder" => Cylinder,
            "Plane" => Plane,
            "Shell" => Shell,

            "CacheOnce" => CacheOnce,
            "FlatCache" | "Wrap" | "Passthrough" | "Debug" | "Exported" | "ImportedValue"
            | "VectorWarp" => Passthrough,

            "HeightAboveSurface" | "SurfaceDensity" | "TerrainBoolean" | "TerrainMask"
            | "BeardDensity" | "ColumnDensity" | "CaveDensity" | "Terrain"
            | "CellWallDistance" | "DistanceToBiomeEdge" | "Pipeline" => ContextDependent,

            _ => return None,
        };
        Some(kind)
    }

    /// Kinds that apply a connected (or inline) curve.
    pub fn uses_curve(self) -> bool {
        matches!(
            self,
            DensityKind::CurveFunction | DensityKind::BlendCurve | DensityKind::Distance
        )
    }
}

// ── Named handles ───────────────────────────────────────────────────

/// Fixed input slots. `Inputs[N]` handles are not here; they go to
/// `ResolvedInputs::array`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Handle {
    Input,
    InputA,
    InputB,
    Factor,
    Condition,
    TrueInput,
    FalseInput,
    Offset,
    Amplitude,
    YProvider,
    WarpSource,
    Curve,
}

impl Handle {
    pub const COUNT: usize = 12;

    pub fn from_name(name: &str) -> Option<Handle> {
        let handle = match name {
            "Input" => Handle::Input,
            "InputA" => Handle::InputA,
            "InputB" => Handle::InputB,
            "Factor" => Handle::Factor,
            "Condition" => Handle::Condition,
            "TrueInput" => Handle::TrueInput,
            "FalseInput" => Handle::FalseInput,
            "Offset" => Handle::Offset,
            "Amplitude" => Handle::Amplitude,
            "YProvider" => Handle::YProvider,
            "WarpSource" => Handle::WarpSource,
            "Curve" => Handle::Curve,
            _ => return None,
        };
        Some(handle)
    }
}

/// What a target-handle string refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleRef {
    Named(Handle),
    /// `Inputs[N]`; a bare `Inputs` is index 0.
    Array(u32),
    Unknown,
}

/// Classify a target handle string.
pub fn classify_handle(handle: &str) -> HandleRef {
    if let Some(named) = Handle::from_name(handle) {
        return HandleRef::Named(named);
    }
    if handle == "Inputs" {
        return HandleRef::Array(0);
    }
    handle
        .strip_prefix("Inputs[")
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|index| index.parse::<u32>().ok())
        .map_or(HandleRef::Unknown, HandleRef::Array)
}

// ── Resolved inputs ─────────────────────────────────────────────────

const NO_INPUT: u32 = u32::MAX;

/// Pre-resolved inputs for one node.
#[derive(Debug, Clone)]
pub struct ResolvedInputs {
    named: [u32; Handle::COUNT],
    /// `(array index, source node)` sorted by array index.
    array: SmallVec<[(u32, u32); 8]>,
}

impl Default for ResolvedInputs {
    fn default() -> Self {
        ResolvedInputs {
            named: [NO_INPUT; Handle::COUNT],
            array: SmallVec::new(),
        }
    }
}

impl ResolvedInputs {
    /// Connect `source` to `handle`. Returns the source it replaced, if any.
    pub fn connect(&mut self, handle: HandleRef, source: usize) -> Option<usize> {
        let source = source as u32;
        match handle {
            HandleRef::Named(h) => {
                let previous = std::mem::replace(&mut self.named[h as usize], source);
                (previous != NO_INPUT).then_some(previous as usize)
            }
            HandleRef::Array(index) => {
                match self.array.binary_search_by_key(&index, |&(i, _)| i) {
                    Ok(pos) => {
                        let previous = std::mem::replace(&mut self.array[pos].1, source);
                        Some(previous as usize)
                    }
                    Err(pos) => {
                        self.array.insert(pos, (index, source));
                        None
                    }
                }
            }
            HandleRef::Unknown => None,
        }
    }

    #[inline(always)]
    pub fn get(&self, handle: Handle) -> Option<usize> {
        let v = self.named[handle as usize];
        (v != NO_INPUT).then_some(v as usize)
    }

    #[inline(always)]
    pub fn has(&self, handle: Handle) -> bool {
        self.named[handle as usize] != NO_INPUT
    }

    /// Source of `Inputs[index]`, if connected.
    pub fn array_at(&self, index: u32) -> Option<usize> {
        self.array
            .binary_search_by_key(&index, |&(i, _)| i)
            .ok()
            .map(|pos| self.array[pos].1 as usize)
    }

    /// Connected array sources in index order.
    pub fn array_sources(&self) -> impl Iterator<Item = usize> + '_ {
        self.array.iter().map(|&(_, src)| src as usize)
    }

    pub fn array_len(&self) -> usize {
        self.array.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_named_and_array_handles() {
        assert_eq!(classify_handle("Input"), HandleRef::Named(Handle::Input));
        assert_eq!(classify_handle("Curve"), HandleRef::Named(Handle::Curve));
        assert_eq!(classify_handle("Inputs[3]"), HandleRef::Array(3));
        assert_eq!(classify_handle("Inputs"), HandleRef::Array(0));
        assert_eq!(classify_handle("Inputs[x]"), HandleRef::Unknown);
        assert_eq!(classify_handle("Material"), HandleRef::Unknown);
    }

    #[test]
    fn array_inputs_sorted_by_index() {
        let mut ri = ResolvedInputs::default();
        ri.connect(HandleRef::Array(2), 7);
        ri.connect(HandleRef::Array(0), 5);
        ri.connect(HandleRef::Array(1), 6);
        assert_eq!(ri.array_sources().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(ri.array_at(1), Some(6));
        assert_eq!(ri.array_at(9), None);
    }

    #[test]
    fn reconnecting_a_handle_replaces_the_source() {
        let mut ri = ResolvedInputs::default();
        assert_eq!(ri.connect(HandleRef::Named(Handle::Input), 1), None);
        assert_eq!(ri.connect(HandleRef::Named(Handle::Input), 2), Some(1));
        assert_eq!(ri.get(Handle::Input), Some(2));

        assert_eq!(ri.connect(HandleRef::Array(0), 3), None);
        assert_eq!(ri.connect(HandleRef::Array(0), 4), Some(3));
        assert_eq!(ri.array_len(), 1);
        assert_eq!(ri.array_at(0), Some(4));
    }

    #[test]
    fn unconnected_slots_are_empty() {
        let ri = ResolvedInputs::default();
        assert!(!ri.has(Handle::Factor));
        assert_eq!(ri.get(Handle::Condition), None);
        assert_eq!(ri.array_len(), 0);
    }

    #[test]
    fn kind_aliases() {
        assert_eq!(
            DensityKind::from_type_name("GradientDensity"),
            Some(DensityKind::YGradient)
        );
        assert_eq!(DensityKind::from_type_name("CubeMath"), Some(DensityKind::Cube));
        assert_eq!(
            DensityKind::from_type_name("Terrain"),
            Some(DensityKind::ContextDependent)
        );
        assert_eq!(DensityKind::from_type_name("Root"), None);
        assert_eq!(DensityKind::from_type_name("Manual"), None);
    }
}
