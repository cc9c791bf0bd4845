//! A whitespace-token decoder for the common METAR and TAF groups.
//!
//! Groups the decoder does not recognise (temperature, pressure, runway state, clear-sky
//! codes) are skipped. Everything after `RMK` is left undecoded.

use chrono::NaiveTime;

use super::{
    CloudCover, CloudLayer, DecodeError, DecodedReport, ReportDecoder, ReportKind, SpeedUnit,
    ValidityPeriod, Wind,
};

const DESCRIPTORS: [&str; 8] = ["MI", "PR", "BC", "DR", "BL", "SH", "TS", "FZ"];

const PHENOMENA: [&str; 22] = [
    "DZ", "RA", "SN", "SG", "PL", "GR", "GS", "UP", "IC", "BR", "FG", "FU", "VA", "DU", "SA",
    "HZ", "PY", "PO", "SQ", "FC", "SS", "DS",
];

/// Rendering used for `9999` and `CAVOK`: ten kilometres or more.
const UNLIMITED_METRIC: &str = "10000m";

#[derive(Debug, Default, Clone, Copy)]
pub struct TokenDecoder;

impl ReportDecoder for TokenDecoder {
    fn decode(&self, kind: ReportKind, text: &str) -> Result<DecodedReport, DecodeError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(DecodeError::Empty);
        }
        let message = tokens.join(" ");

        let mut pos = 0;
        while pos < tokens.len() && is_modifier(tokens[pos]) {
            pos += 1;
        }

        let station = match tokens.get(pos) {
            Some(t) if is_station(t) => t.to_string(),
            _ => return Err(DecodeError::MissingStation(message)),
        };
        pos += 1;

        let issued = tokens.get(pos).and_then(|t| parse_issue_time(t));
        if issued.is_some() {
            pos += 1;
        }

        let mut validity = None;
        if kind == ReportKind::Forecast {
            validity = tokens.get(pos).and_then(|t| parse_validity(t));
            if validity.is_some() {
                pos += 1;
            }
        }

        let (day, time) = match (issued, validity) {
            (Some((day, time)), _) => (day, Some(time)),
            (None, Some(v)) if kind == ReportKind::Forecast => (v.start_day, None),
            _ => return Err(DecodeError::MissingTime(message)),
        };

        let mut report = DecodedReport {
            kind,
            message,
            station,
            day,
            time,
            wind: None,
            visibility: None,
            clouds: Vec::new(),
            weather: Vec::new(),
            validity,
            changes: Vec::new(),
        };

        decode_body(&mut report, &tokens[pos..])?;

        Ok(report)
    }
}

fn decode_body(report: &mut DecodedReport, tokens: &[&str]) -> Result<(), DecodeError> {
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];

        if token == "RMK" {
            break;
        }

        let starts_changes = match report.kind {
            ReportKind::Forecast => is_change_indicator(token),
            ReportKind::Observation => is_trend_indicator(token),
        };
        if starts_changes {
            report.changes = split_change_groups(&tokens[i..]);
            break;
        }

        if token == "CAVOK" {
            report.visibility.get_or_insert_with(|| UNLIMITED_METRIC.to_string());
        } else if let Some(wind) = parse_wind(token) {
            let wind = wind?;
            report.wind.get_or_insert(wind);
        } else if let Some(layer) = parse_cloud(token) {
            report.clouds.push(layer?);
        } else if report.visibility.is_none() && is_whole_miles(token) {
            // "1 1/2SM" arrives as two tokens
            match tokens.get(i + 1) {
                Some(next) if next.ends_with("SM") && next.contains('/') => {
                    report.visibility = Some(format!("{} {}", token, next));
                    i += 1;
                }
                _ => {}
            }
        } else if let Some(visibility) = parse_visibility(token) {
            report.visibility.get_or_insert(visibility);
        } else if is_weather(token) {
            report.weather.push(token.to_string());
        }

        i += 1;
    }

    report.clouds.sort_by_key(|layer| layer.height_ft);

    Ok(())
}

fn is_modifier(token: &str) -> bool {
    matches!(token, "METAR" | "SPECI" | "TAF" | "AMD" | "COR" | "RTD")
}

fn is_station(token: &str) -> bool {
    token.len() == 4
        && token.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && token.as_bytes()[0].is_ascii_uppercase()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a `DDHHMMZ` group.
fn parse_issue_time(token: &str) -> Option<(u32, NaiveTime)> {
    let digits = token.strip_suffix('Z')?;
    if digits.len() != 6 || !all_digits(digits) {
        return None;
    }
    let day: u32 = digits[0..2].parse().ok()?;
    let hour: u32 = digits[2..4].parse().ok()?;
    let minute: u32 = digits[4..6].parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }

    NaiveTime::from_hms_opt(hour, minute, 0).map(|time| (day, time))
}

/// Parses a `DDHH/DDHH` validity group. Hour 24 is legal as an end of day.
fn parse_validity(token: &str) -> Option<ValidityPeriod> {
    let (start, end) = token.split_once('/')?;
    if start.len() != 4 || end.len() != 4 || !all_digits(start) || !all_digits(end) {
        return None;
    }

    let period = ValidityPeriod {
        start_day: start[0..2].parse().ok()?,
        start_hour: start[2..4].parse().ok()?,
        end_day: end[0..2].parse().ok()?,
        end_hour: end[2..4].parse().ok()?,
    };

    if period.start_hour > 24 || period.end_hour > 24 {
        return None;
    }

    Some(period)
}

fn parse_wind(token: &str) -> Option<Result<Wind, DecodeError>> {
    let (body, unit) = if let Some(body) = token.strip_suffix("KT") {
        (body, SpeedUnit::Knots)
    } else if let Some(body) = token.strip_suffix("MPS") {
        (body, SpeedUnit::MetresPerSecond)
    } else if let Some(body) = token.strip_suffix("KMH") {
        (body, SpeedUnit::KilometresPerHour)
    } else {
        return None;
    };

    let dir = body.get(..3)?;
    let rest = body.get(3..)?;
    let direction = if dir == "VRB" {
        None
    } else if all_digits(dir) {
        dir.parse().ok()
    } else {
        // "/////KT": wind not measured
        return None;
    };

    let invalid = || DecodeError::InvalidGroup {
        group: "wind",
        token: token.to_string(),
    };

    let (speed, gust) = match rest.split_once('G') {
        Some((speed, gust)) => (speed, Some(gust)),
        None => (rest, None),
    };
    if !all_digits(speed) || speed.len() > 3 {
        return Some(Err(invalid()));
    }
    let speed = match speed.parse() {
        Ok(v) => v,
        Err(_) => return Some(Err(invalid())),
    };
    let gust = match gust {
        Some(g) if all_digits(g) && g.len() <= 3 => match g.parse() {
            Ok(v) => Some(v),
            Err(_) => return Some(Err(invalid())),
        },
        Some(_) => return Some(Err(invalid())),
        None => None,
    };

    Some(Ok(Wind {
        direction,
        speed,
        gust,
        unit,
    }))
}

fn parse_cloud(token: &str) -> Option<Result<CloudLayer, DecodeError>> {
    let cover = CloudCover::from_code(token.get(..3)?)?;
    let height = token.get(3..6)?;
    if height == "///" {
        return None;
    }
    if !all_digits(height) {
        return Some(Err(DecodeError::InvalidGroup {
            group: "cloud",
            token: token.to_string(),
        }));
    }
    match token.get(6..) {
        Some("" | "CB" | "TCU" | "///") | None => {}
        Some(_) => {
            return Some(Err(DecodeError::InvalidGroup {
                group: "cloud",
                token: token.to_string(),
            }))
        }
    }
    let hundreds: u32 = height.parse().ok()?;

    Some(Ok(CloudLayer {
        cover,
        height_ft: hundreds * 100,
    }))
}

fn is_whole_miles(token: &str) -> bool {
    token.len() <= 2 && all_digits(token)
}

/// Renders a visibility group the way the normalizer expects it.
fn parse_visibility(token: &str) -> Option<String> {
    if token.ends_with("SM") {
        return Some(token.to_string());
    }

    let metres = token.strip_suffix("NDV").unwrap_or(token);
    if metres.len() == 4 && all_digits(metres) {
        if metres == "9999" {
            return Some(UNLIMITED_METRIC.to_string());
        }
        let value: u32 = metres.parse().ok()?;
        return Some(format!("{}m", value));
    }

    None
}

fn is_weather(token: &str) -> bool {
    let mut rest = token;
    for prefix in ["+", "-", "VC"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }
    if rest.is_empty() || !rest.is_ascii() || rest.len() % 2 != 0 {
        return false;
    }

    let chunks: Vec<&str> = (0..rest.len()).step_by(2).map(|i| &rest[i..i + 2]).collect();
    let body = if DESCRIPTORS.contains(&chunks[0]) {
        &chunks[1..]
    } else {
        &chunks[..]
    };

    if body.is_empty() {
        // a descriptor on its own, e.g. "TS" or "VCSH"
        return true;
    }

    body.iter().all(|chunk| PHENOMENA.contains(chunk))
}

/// METAR trend groups describe the next two hours, not current conditions.
fn is_trend_indicator(token: &str) -> bool {
    matches!(token, "TEMPO" | "BECMG" | "NOSIG")
}

fn is_change_indicator(token: &str) -> bool {
    if matches!(token, "TEMPO" | "BECMG" | "INTER" | "NOSIG") {
        return true;
    }
    if let Some(digits) = token.strip_prefix("FM") {
        return digits.len() == 6 && all_digits(digits);
    }
    if let Some(digits) = token.strip_prefix("PROB") {
        return digits.len() == 2 && all_digits(digits);
    }

    false
}

fn split_change_groups(tokens: &[&str]) -> Vec<String> {
    let mut groups: Vec<Vec<&str>> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if *token == "RMK" {
            break;
        }
        let continues_probability =
            matches!(*token, "TEMPO" | "INTER") && i > 0 && tokens[i - 1].starts_with("PROB");
        if is_change_indicator(token) && !continues_probability {
            groups.push(vec![token]);
        } else if let Some(group) = groups.last_mut() {
            group.push(token);
        }
    }

    groups.into_iter().map(|g| g.join(" ")).collect()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_metar(text: &str) -> DecodedReport {
        TokenDecoder.decode(ReportKind::Observation, text).unwrap()
    }

    #[test]
    fn should_decode_metar() {
        let r = decode_metar(
            "KCLM 011953Z 24012G20KT 10SM -RA FEW025 BKN035 OVC050 12/08 A2992 RMK AO2 SLP135",
        );

        assert_eq!(r.kind, ReportKind::Observation);
        assert_eq!(r.station, "KCLM");
        assert_eq!(r.day, 1);
        assert_eq!(r.time, NaiveTime::from_hms_opt(19, 53, 0));
        assert_eq!(
            r.wind,
            Some(Wind {
                direction: Some(240),
                speed: 12,
                gust: Some(20),
                unit: SpeedUnit::Knots,
            })
        );
        assert_eq!(r.visibility.as_deref(), Some("10SM"));
        assert_eq!(r.weather, vec!["-RA".to_string()]);
        assert_eq!(r.clouds.len(), 3);
        assert_eq!(r.clouds[1].cover, CloudCover::Broken);
        assert_eq!(r.clouds[1].height_ft, 3500);
        assert!(r.validity.is_none());
    }

    #[test]
    fn should_keep_message_canonical() {
        let r = decode_metar("KCLM  011953Z   00000KT 10SM CLR");
        assert_eq!(r.message, "KCLM 011953Z 00000KT 10SM CLR");
    }

    #[test]
    fn should_join_split_fraction_visibility() {
        let r = decode_metar("KCLM 020653Z VRB03KT 1 1/2SM BR OVC004 06/06 A3001");

        assert_eq!(r.visibility.as_deref(), Some("1 1/2SM"));
        assert_eq!(r.wind.as_ref().unwrap().direction, None);
        assert_eq!(r.weather, vec!["BR".to_string()]);
    }

    #[test]
    fn should_render_metric_visibility() {
        let r = decode_metar("EGLL 011950Z 27008MPS 1600 SHRA SCT012CB 10/09 Q1002");
        assert_eq!(r.visibility.as_deref(), Some("1600m"));
        assert_eq!(r.wind.as_ref().unwrap().unit, SpeedUnit::MetresPerSecond);
        assert_eq!(r.clouds[0].cover, CloudCover::Scattered);
        assert_eq!(r.clouds[0].height_ft, 1200);

        let r = decode_metar("EGLL 011950Z 27008KT CAVOK 10/09 Q1002");
        assert_eq!(r.visibility.as_deref(), Some("10000m"));
    }

    #[test]
    fn should_ignore_trend_groups() {
        let r = decode_metar(
            "EGLL 011950Z 27008KT 9999 FEW030 10/09 Q1002 TEMPO 3000 SHRA BKN012",
        );

        assert_eq!(r.visibility.as_deref(), Some("10000m"));
        assert_eq!(r.clouds.len(), 1);
        assert_eq!(r.clouds[0].cover, CloudCover::Few);
        assert!(r.weather.is_empty());
        assert_eq!(r.changes, vec!["TEMPO 3000 SHRA BKN012".to_string()]);

        let r = decode_metar("EGLL 011950Z 27008KT 9999 BKN030 10/09 Q1002 NOSIG");
        assert_eq!(r.clouds.len(), 1);
        assert_eq!(r.changes, vec!["NOSIG".to_string()]);
    }

    #[test]
    fn should_decode_taf_with_change_groups() {
        let r = TokenDecoder
            .decode(
                ReportKind::Forecast,
                "TAF KCLM 011720Z 0118/0218 24010KT P6SM SCT050 FM012200 27015G25KT P6SM BKN030 PROB30 TEMPO 0206/0210 3SM -SHRA",
            )
            .unwrap();

        assert_eq!(r.kind, ReportKind::Forecast);
        assert_eq!(r.day, 1);
        assert_eq!(
            r.validity,
            Some(ValidityPeriod {
                start_day: 1,
                start_hour: 18,
                end_day: 2,
                end_hour: 18,
            })
        );
        assert_eq!(r.visibility.as_deref(), Some("P6SM"));
        assert_eq!(r.clouds.len(), 1);
        assert_eq!(
            r.changes,
            vec![
                "FM012200 27015G25KT P6SM BKN030".to_string(),
                "PROB30 TEMPO 0206/0210 3SM -SHRA".to_string(),
            ]
        );
    }

    #[test]
    fn should_fall_back_to_validity_day_without_issue_time() {
        let r = TokenDecoder
            .decode(ReportKind::Forecast, "TAF AMD KCLM 0312/0412 00000KT P6SM SKC")
            .unwrap();
        assert_eq!(r.day, 3);
        assert!(r.time.is_none());
    }

    #[test]
    fn should_reject_missing_station() {
        let err = TokenDecoder
            .decode(ReportKind::Observation, "011953Z 24012KT")
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingStation(_)));
    }

    #[test]
    fn should_reject_missing_time() {
        let err = TokenDecoder
            .decode(ReportKind::Observation, "KCLM 24012KT 10SM")
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingTime(_)));
    }

    #[test]
    fn should_reject_malformed_wind() {
        let err = TokenDecoder
            .decode(ReportKind::Observation, "KCLM 011953Z 240X2KT 10SM")
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidGroup { group: "wind", .. }));
    }

    #[test]
    fn should_recognise_weather_groups() {
        assert!(is_weather("+TSRA"));
        assert!(is_weather("VCSH"));
        assert!(is_weather("FZFG"));
        assert!(is_weather("TS"));
        assert!(!is_weather("SCT050"));
        assert!(!is_weather("A2992"));
        assert!(!is_weather("RMK"));
    }
}
