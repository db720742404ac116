use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Every kind of thing the game places on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    Pine,
    Birch,
    Daisy,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Player,
        Category::Pine,
        Category::Birch,
        Category::Daisy,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Player => "player",
            Category::Pine => "pine",
            Category::Birch => "birch",
            Category::Daisy => "daisy",
        }
    }

    pub fn is_scenery(&self) -> bool {
        !matches!(self, Category::Player)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YawPolicy {
    Fixed,
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LightRig {
    Ambient { color: u32 },
    Directional { color: u32, directions: Vec<[f64; 3]> },
}

impl LightRig {
    pub fn ambient() -> Self {
        LightRig::Ambient { color: 0x404040 }
    }

    /// Two soft lights, one from each side of the model, slightly overhead.
    pub fn twin_directional() -> Self {
        LightRig::Directional {
            color: 0xc0c0c0,
            directions: vec![normalize([0.0, -70.0, 100.0]), normalize([0.0, 70.0, 100.0])],
        }
    }
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}

/// How one category is drawn: which model, how big, how lit and how oriented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    pub asset: String,
    pub base_scale: f64,
    pub light_rig: LightRig,
    pub yaw: YawPolicy,
    /// Model-space offset applied before the yaw, in model units.
    #[serde(default)]
    pub offset: [f64; 3],
}

impl CategoryPolicy {
    fn scenery(asset: &str) -> Self {
        CategoryPolicy {
            asset: asset.to_string(),
            base_scale: 30.0,
            light_rig: LightRig::twin_directional(),
            yaw: YawPolicy::Random,
            offset: [0.0; 3],
        }
    }

    pub fn validate(&self, category: Category) -> Result<(), SettingsError> {
        let invalid = |reason: &str| SettingsError::InvalidPolicy {
            category: category.to_string(),
            reason: reason.to_string(),
        };
        if self.asset.trim().is_empty() {
            return Err(invalid("asset path is empty"));
        }
        if !(self.base_scale.is_finite() && self.base_scale > 0.0) {
            return Err(invalid("base_scale must be a positive number"));
        }
        if self.offset.iter().any(|v| !v.is_finite()) {
            return Err(invalid("offset must be finite"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTable {
    pub player: CategoryPolicy,
    pub pine: CategoryPolicy,
    pub birch: CategoryPolicy,
    pub daisy: CategoryPolicy,
}

impl Default for PolicyTable {
    fn default() -> Self {
        PolicyTable {
            player: CategoryPolicy {
                asset: "player/scene.gltf".to_string(),
                base_scale: 1.0,
                light_rig: LightRig::ambient(),
                yaw: YawPolicy::Fixed,
                offset: [0.0; 3],
            },
            pine: CategoryPolicy::scenery("pine_tree/scene.gltf"),
            birch: CategoryPolicy {
                offset: [-20.0, 0.0, 0.0],
                ..CategoryPolicy::scenery("birch_tree/scene.gltf")
            },
            daisy: CategoryPolicy::scenery("daisy_tree/scene.gltf"),
        }
    }
}

impl PolicyTable {
    pub fn get(&self, category: Category) -> &CategoryPolicy {
        match category {
            Category::Player => &self.player,
            Category::Pine => &self.pine,
            Category::Birch => &self.birch,
            Category::Daisy => &self.daisy,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for category in Category::ALL {
            self.get(category).validate(category)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_game_assets() {
        let table = PolicyTable::default();
        assert_eq!(table.get(Category::Player).base_scale, 1.0);
        assert_eq!(table.get(Category::Player).yaw, YawPolicy::Fixed);
        for category in [Category::Pine, Category::Birch, Category::Daisy] {
            let policy = table.get(category);
            assert_eq!(policy.base_scale, 30.0);
            assert_eq!(policy.yaw, YawPolicy::Random);
        }
        assert_eq!(table.get(Category::Birch).offset, [-20.0, 0.0, 0.0]);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn twin_lights_are_unit_length() {
        if let LightRig::Directional { directions, .. } = LightRig::twin_directional() {
            for d in directions {
                let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
                assert!((len - 1.0).abs() < 1e-12);
            }
        } else {
            panic!("expected directional rig");
        }
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let mut table = PolicyTable::default();
        table.daisy.base_scale = 0.0;
        assert!(matches!(
            table.validate(),
            Err(SettingsError::InvalidPolicy { ref category, .. }) if category == "daisy"
        ));
    }
}
