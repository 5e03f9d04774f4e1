use std::fmt;

use anyhow::{bail, Result};

/// A coordinate reference system identified by its EPSG code.
/// Only systems with a known PROJ.4 definition can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    /// WGS84 longitude/latitude (EPSG:4326).
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// WGS84 / UTM zone 33S (EPSG:32733).
    pub const UTM_33S: Crs = Crs { epsg: 32733 };

    /// Look up a supported CRS by EPSG code.
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        if proj4_definition(epsg).is_none() {
            bail!("unsupported coordinate reference system EPSG:{epsg}");
        }
        Ok(Self { epsg })
    }

    /// Build the WGS84 (north) or NAD83 UTM system for a zone.
    pub fn utm(zone: u32, south: bool, nad83: bool) -> Result<Self> {
        let epsg = match (nad83, south) {
            (false, false) => 32600 + zone,
            (false, true) => 32700 + zone,
            (true, false) => 26900 + zone,
            (true, true) => bail!("NAD83 UTM zones are only defined in the northern hemisphere"),
        };
        Self::from_epsg(epsg)
    }

    /// Get the EPSG code.
    #[inline] pub fn epsg(&self) -> u32 { self.epsg }

    /// True for angular (degree-based) systems, which must never be used for distances.
    #[inline]
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, 4326 | 4269 | 4258)
    }

    /// PROJ.4 definition for this system.
    pub(crate) fn proj4(&self) -> String {
        proj4_definition(self.epsg).unwrap_or_default()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl TryFrom<u32> for Crs {
    type Error = anyhow::Error;

    fn try_from(epsg: u32) -> Result<Self> { Self::from_epsg(epsg) }
}

/// PROJ.4 strings for the supported registry.
/// - WGS84 UTM: 326zz (north) / 327zz (south)
/// - NAD83 UTM: 269zz (north only, zones 1-23)
fn proj4_definition(epsg: u32) -> Option<String> {
    let utm = |zone: u32, south: bool, datum: &str| {
        let south = if south { " +south" } else { "" };
        format!("+proj=utm +zone={zone}{south} +datum={datum} +units=m +no_defs +type=crs")
    };

    match epsg {
        4326 => Some("+proj=longlat +datum=WGS84 +no_defs +type=crs".to_string()),
        4269 => Some("+proj=longlat +datum=NAD83 +no_defs +type=crs".to_string()),
        4258 => Some("+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs +type=crs".to_string()),
        3857 => Some("+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs".to_string()),
        32601..=32660 => Some(utm(epsg - 32600, false, "WGS84")),
        32701..=32760 => Some(utm(epsg - 32700, true, "WGS84")),
        26901..=26923 => Some(utm(epsg - 26900, false, "NAD83")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_accepts_known_codes() {
        assert_eq!(Crs::from_epsg(4326).unwrap(), Crs::WGS84);
        assert_eq!(Crs::from_epsg(32733).unwrap(), Crs::UTM_33S);
        assert!(Crs::from_epsg(3857).is_ok());
        assert!(Crs::from_epsg(26917).is_ok());
        assert!(Crs::from_epsg(2154).is_err());
        assert!(Crs::try_from(32661).is_err());
    }

    #[test]
    fn geographic_and_projected_are_distinguished() {
        assert!(Crs::WGS84.is_geographic());
        assert!(Crs::from_epsg(4269).unwrap().is_geographic());
        assert!(!Crs::UTM_33S.is_geographic());
        assert!(!Crs::from_epsg(3857).unwrap().is_geographic());
    }

    #[test]
    fn utm_zones_map_to_epsg_codes() {
        assert_eq!(Crs::utm(33, true, false).unwrap(), Crs::UTM_33S);
        assert_eq!(Crs::utm(17, false, true).unwrap().epsg(), 26917);
        assert!(Crs::utm(17, true, true).is_err());
        assert!(Crs::utm(61, false, false).is_err());
    }

    #[test]
    fn proj4_strings() {
        assert_eq!(
            Crs::UTM_33S.proj4(),
            "+proj=utm +zone=33 +south +datum=WGS84 +units=m +no_defs +type=crs"
        );
        assert_eq!(Crs::UTM_33S.to_string(), "EPSG:32733");
    }
}
