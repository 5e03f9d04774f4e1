use std::fmt;

use serde::{Deserialize, Serialize};

/// Infrastructure category used as a distance target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Health,
    Police,
    Roads,
}

impl Category {
    /// All categories in scoring order.
    pub const ALL: [Category; 3] = [Category::Health, Category::Police, Category::Roads];

    /// Short key used in column names and configuration.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Health => "health",
            Category::Police => "police",
            Category::Roads => "roads",
        }
    }

    /// Default source file name inside the reference dataset directory.
    pub fn default_file(&self) -> &'static str {
        match self {
            Category::Health => "Health Facilities.shp",
            Category::Police => "Police Stations.shp",
            Category::Roads => "Trunk Roads N13.shp",
        }
    }

    /// Name of the distance column, e.g. `dist_health`.
    pub fn distance_column(&self) -> String { format!("dist_{}", self.key()) }

    /// Name of the score column, e.g. `health_score`.
    pub fn score_column(&self) -> String { format!("{}_score", self.key()) }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names() {
        assert_eq!(Category::Health.distance_column(), "dist_health");
        assert_eq!(Category::Roads.score_column(), "roads_score");
    }
}
