use std::{fs, path::Path, sync::LazyLock};

use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::crs::Crs;

/// `AUTHORITY["EPSG","32733"]` (WKT1) or `ID["EPSG",32733]` (WKT2) closing the outermost node.
static TOP_LEVEL_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:AUTHORITY|ID)\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]\s*\]\s*$"#).unwrap()
});

/// Root node keyword and name, e.g. `PROJCS["WGS_1984_UTM_Zone_33S"`.
static ROOT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*([A-Z]+)\[\s*"([^"]*)""#).unwrap()
});

/// UTM names as written by ESRI (`WGS_1984_UTM_Zone_33S`) and OGC (`WGS 84 / UTM zone 33S`).
static UTM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(WGS[ _]?(?:19)?84|NAD[ _]?(?:19)?83)[\W_]*UTM[ _]zone[ _](\d{1,2})([NS])$").unwrap()
});

/// Identify the CRS described by a WKT string, as found in a shapefile `.prj` sidecar.
pub fn crs_from_wkt(wkt: &str) -> Result<Crs> {
    let wkt = wkt.trim();

    if let Some(captures) = TOP_LEVEL_AUTHORITY.captures(wkt) {
        let epsg: u32 = captures[1].parse()?;
        return Crs::from_epsg(epsg);
    }

    let Some(captures) = ROOT_NAME.captures(wkt) else {
        bail!("unrecognised WKT definition: {wkt}")
    };
    let (keyword, name) = (&captures[1], captures[2].trim());

    match keyword {
        "PROJCS" | "PROJCRS" => {
            if let Some(utm) = UTM_NAME.captures(name) {
                let zone: u32 = utm[2].parse()?;
                let south = utm[3].eq_ignore_ascii_case("S");
                let nad83 = utm[1].to_ascii_uppercase().starts_with("NAD");
                return Crs::utm(zone, south, nad83);
            }
            let squashed = squash(name);
            if squashed.contains("webmercator") || squashed.contains("pseudomercator") {
                return Crs::from_epsg(3857);
            }
        }
        "GEOGCS" | "GEOGCRS" | "GEODCRS" => {
            match squash(name).as_str() {
                "gcswgs1984" | "wgs84" | "wgs1984" => return Ok(Crs::WGS84),
                "gcsnorthamerican1983" | "nad83" => return Crs::from_epsg(4269),
                "gcsetrs1989" | "etrs89" => return Crs::from_epsg(4258),
                _ => {}
            }
        }
        _ => {}
    }

    bail!("unsupported coordinate reference system {name:?}")
}

/// Read the `.prj` sidecar of a shapefile. No sidecar means the CRS is undefined.
pub fn crs_from_shapefile(path: &Path) -> Result<Option<Crs>> {
    let Some(prj) = ["prj", "PRJ"].iter()
        .map(|extension| path.with_extension(extension))
        .find(|candidate| candidate.is_file())
    else {
        return Ok(None)
    };

    let wkt = fs::read_to_string(&prj)
        .with_context(|| format!("Failed to read projection file: {}", prj.display()))?;
    let crs = crs_from_wkt(&wkt)
        .with_context(|| format!("Unsupported projection in {}", prj.display()))?;
    Ok(Some(crs))
}

/// Lowercase and drop everything but letters and digits.
fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
