pub mod manifest;
pub mod settings;
pub mod world_structure;

pub use manifest::Manifest;
pub use settings::SettingsAsset;
pub use world_structure::{BiomeRangeAsset, WorldStructureAsset};

use serde::{Deserialize, Serialize};

/// A range with min/max double values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RangeDouble {
    #[serde(rename = "Min")]
    pub min: f64,
    #[serde(rename = "Max")]
    pub max: f64,
}

/// Category of a V2 asset type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Density,
    Curve,
    Pattern,
    MaterialProvider,
    PositionProvider,
    Prop,
    Scanner,
    Assignment,
    VectorProvider,
    EnvironmentProvider,
    TintProvider,
    BlockMask,
    Directionality,
    Terrain,
    Framework,
    WorldStructure,
    Biome,
    Settings,
}

impl AssetCategory {
    const ALL: [AssetCategory; 18] = [
        AssetCategory::Density,
        AssetCategory::Curve,
        AssetCategory::Pattern,
        AssetCategory::MaterialProvider,
        AssetCategory::PositionProvider,
        AssetCategory::Prop,
        AssetCategory::Scanner,
        AssetCategory::Assignment,
        AssetCategory::VectorProvider,
        AssetCategory::EnvironmentProvider,
        AssetCategory::TintProvider,
        AssetCategory::BlockMask,
        AssetCategory::Directionality,
        AssetCategory::Terrain,
        AssetCategory::Framework,
        AssetCategory::WorldStructure,
        AssetCategory::Biome,
        AssetCategory::Settings,
    ];

    /// Suffix used in native `$NodeId` values, e.g. `DensityNode` in
    /// `ClampDensityNode-3`.
    pub fn native_suffix(self) -> &'static str {
        match self {
            AssetCategory::Density => "DensityNode",
            AssetCategory::Curve => "CurveNode",
            AssetCategory::Pattern => "PatternNode",
            AssetCategory::MaterialProvider => "MaterialProviderNode",
            AssetCategory::PositionProvider => "PositionProviderNode",
            AssetCategory::Prop => "PropNode",
            AssetCategory::Scanner => "ScannerNode",
            AssetCategory::Assignment => "AssignmentsNode",
            AssetCategory::VectorProvider => "VectorProviderNode",
            AssetCategory::EnvironmentProvider => "EnvironmentProviderNode",
            AssetCategory::TintProvider => "TintProviderNode",
            AssetCategory::BlockMask => "BlockMaskNode",
            AssetCategory::Directionality => "DirectionalityNode",
            AssetCategory::Terrain => "TerrainNode",
            AssetCategory::Framework => "FrameworkNode",
            AssetCategory::WorldStructure => "WorldStructureNode",
            AssetCategory::Biome => "BiomeNode",
            AssetCategory::Settings => "SettingsNode",
        }
    }

    /// Category named by a native `$NodeId` (`<Type><Suffix>-<n>`). The
    /// longest matching suffix wins.
    pub fn from_node_id(node_id: &str) -> Option<AssetCategory> {
        let stem = match node_id.rsplit_once('-') {
            Some((stem, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => stem,
            _ => node_id,
        };
        Self::ALL
            .iter()
            .copied()
            .filter(|c| stem.ends_with(c.native_suffix()))
            .max_by_key(|c| c.native_suffix().len())
    }

    /// Category of a child asset found under `field` of an asset in this
    /// category.
    pub fn child_category(self, field: &str) -> AssetCategory {
        match field {
            "Curve" | "ReturnCurve" | "DistanceCurve" | "AngleCurve" => AssetCategory::Curve,
            "Density" | "Condition" | "ReturnDensity" | "YProvider" => AssetCategory::Density,
            "MaterialProvider" => AssetCategory::MaterialProvider,
            "Solid" | "Empty" | "Low" | "High" if self == AssetCategory::MaterialProvider => {
                AssetCategory::MaterialProvider
            }
            "Positions" => AssetCategory::PositionProvider,
            "Assignments" => AssetCategory::Assignment,
            "Prop" => AssetCategory::Prop,
            "Pattern" => AssetCategory::Pattern,
            "Scanner" => AssetCategory::Scanner,
            "VectorProvider" | "WarpVector" => AssetCategory::VectorProvider,
            "BlockMask" => AssetCategory::BlockMask,
            "Directionality" => AssetCategory::Directionality,
            "Terrain" => AssetCategory::Terrain,
            "EnvironmentProvider" => AssetCategory::EnvironmentProvider,
            "TintProvider" => AssetCategory::TintProvider,
            _ => self,
        }
    }

    /// Whether `field` names a slot that holds a child asset rather than
    /// plain data.
    pub fn is_asset_field(field: &str) -> bool {
        matches!(
            field,
            "Input"
                | "Inputs"
                | "InputA"
                | "InputB"
                | "Factor"
                | "Curve"
                | "ReturnCurve"
                | "DistanceCurve"
                | "AngleCurve"
                | "Density"
                | "Condition"
                | "ReturnDensity"
                | "YProvider"
                | "MaterialProvider"
                | "Positions"
                | "Assignments"
                | "Prop"
                | "Pattern"
                | "Scanner"
                | "VectorProvider"
                | "WarpVector"
                | "BlockMask"
                | "Directionality"
                | "Terrain"
                | "EnvironmentProvider"
                | "TintProvider"
        )
    }
}
