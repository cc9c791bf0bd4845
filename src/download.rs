//! Downloads one month of METAR/TAF bulk text for a station from Ogimet.
//!
//! The reports are returned inside a single `<pre>` block of an HTML page.

use anyhow::{anyhow, Error, Result};

use crate::archive::days_in_month;

pub const OGIMET_URL: &str = "https://www.ogimet.com/display_metars2.php";

/// Builds the query for every report issued in the given month.
pub fn month_query(station: &str, year: i32, month: u32) -> Result<Vec<(&'static str, String)>> {
    let last_day = days_in_month(year, month)
        .ok_or_else(|| anyhow!("Invalid month {}-{:02}", year, month))?;
    let month = format!("{:02}", month);

    Ok(vec![
        ("lang", "en".to_string()),
        ("lugar", station.to_lowercase()),
        ("tipo", "ALL".to_string()),
        ("ord", "REV".to_string()),
        ("nil", "SI".to_string()),
        ("fmt", "txt".to_string()),
        ("ano", year.to_string()),
        ("mes", month.clone()),
        ("day", "01".to_string()),
        ("hora", "00".to_string()),
        ("anof", year.to_string()),
        ("mesf", month),
        ("dayf", format!("{:02}", last_day)),
        ("horaf", "23".to_string()),
        ("minf", "59".to_string()),
        ("send", "send".to_string()),
    ])
}

/// Fetches the month's bulk text for the station.
pub async fn fetch_month(
    client: &reqwest::Client,
    station: &str,
    year: i32,
    month: u32,
) -> Result<String, Error> {
    let params = month_query(station, year, month)?;

    let response = client
        .get(OGIMET_URL)
        .query(&params)
        .send()
        .await
        .map_err(|e| Error::msg(format!("Failed to download {} {}-{:02}: {}", station, year, month, e)))?;

    if !response.status().is_success() {
        return Err(Error::msg(format!(
            "Failed to download {} {}-{:02}: {}",
            station,
            year,
            month,
            response.status()
        )));
    }

    let body = response.text().await?;

    extract_pre_block(&body)
}

/// Returns the trimmed contents of the first `<pre>` block.
pub fn extract_pre_block(html: &str) -> Result<String> {
    let missing = || Error::msg("Unable to locate METAR/TAF data in the response");

    let start = html.find("<pre").ok_or_else(missing)?;
    let content_start = start + html[start..].find('>').ok_or_else(missing)? + 1;
    let content_end = content_start + html[content_start..].find("</pre>").ok_or_else(missing)?;

    Ok(html[content_start..content_end].trim().to_string())
}

// -- Tests -------------------------------------------------------------------
