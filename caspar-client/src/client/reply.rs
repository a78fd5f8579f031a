//! Parsers for AMCP reply bodies.
//!
//! Every parser here is lenient: missing or malformed fields come back as
//! `None` instead of an error.

use log::{debug, warn};

use hyperdeck_protocol::{frames_to_timecode, guess_video_format};

use crate::types::{ClipInfo, LayerStatus};

fn non_empty_lines(resp: &str) -> Vec<&str> {
    resp.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.is_empty())
        .collect()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a `CLS` block into bare clip names, in server order.
///
/// The first line is the status line. Each remaining line contributes its
/// first quoted token, or its first whitespace-delimited token.
pub fn parse_clip_list(resp: &str) -> Vec<String> {
    let lines = non_empty_lines(resp);
    let Some((status, entries)) = lines.split_first() else {
        return Vec::new();
    };
    debug!("[Caspar] < {}", status);

    let mut clips = Vec::new();
    for line in entries {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let name = match trimmed.strip_prefix('"') {
            Some(rest) => match rest.find('"') {
                Some(end) if end > 0 => &rest[..end],
                _ => rest.split_whitespace().next().unwrap_or(""),
            },
            None => trimmed.split_whitespace().next().unwrap_or(""),
        };

        if !name.is_empty() {
            clips.push(name.to_string());
        }
    }
    clips
}

/// Parse a `CINF` reply.
///
/// ```text
/// 201 CINF OK
/// "AMB"  MOVIE  6445960 20170413141655 268 1/25
/// ```
///
/// The last token is seconds-per-frame as `num/den`, so the rate is
/// `den / num`. The token before it is the frame count.
pub fn parse_clip_info(resp: &str) -> ClipInfo {
    let lines = non_empty_lines(resp);
    if lines.len() < 2 {
        warn!("[Caspar] CINF response too short: {:?}", resp);
        return ClipInfo::default();
    }

    let info_line = lines[1].trim();
    debug!("[Caspar] < {}", lines[0]);
    debug!("[Caspar] < {}", info_line);

    let tokens: Vec<&str> = info_line.split_whitespace().collect();
    let mut fps = None;
    let mut frames = None;

    if tokens.len() >= 2 {
        let timebase = tokens[tokens.len() - 1];
        if let Some((num, den)) = timebase.split_once('/') {
            if is_digits(num) && is_digits(den) {
                if let (Ok(num), Ok(den)) = (num.parse::<u64>(), den.parse::<u64>()) {
                    if num != 0 && den != 0 {
                        fps = Some(den as f64 / num as f64);
                    }
                }
            }
        }

        let frame_token = tokens[tokens.len() - 2];
        if is_digits(frame_token) {
            frames = frame_token.parse::<u64>().ok();
        }
    }

    let duration = match (frames, fps) {
        (Some(frames), Some(fps)) => frames_to_timecode(frames, fps),
        _ => None,
    };

    ClipInfo {
        fps,
        frames,
        duration,
        video_format: fps.and_then(guess_video_format),
    }
}

/// Bodies of `<tag>body</tag>` elements whose body has no `<` and passes `accept`.
fn tag_values<'a>(xml: &'a str, tag: &str, accept: impl Fn(&str) -> bool) -> Vec<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let mut values = Vec::new();
    let mut from = 0;

    while let Some(found) = xml[from..].find(&open) {
        let body_start = from + found + open.len();
        from = body_start;

        let Some(body_len) = xml[body_start..].find('<') else {
            break;
        };
        let body = &xml[body_start..body_start + body_len];
        if !body.is_empty() && accept(body) && xml[body_start + body_len..].starts_with(&close) {
            values.push(body);
        }
    }
    values
}

fn first_tag<'a>(xml: &'a str, tag: &str, accept: impl Fn(&str) -> bool) -> Option<&'a str> {
    tag_values(xml, tag, accept).into_iter().next()
}

fn is_bool(s: &str) -> bool {
    s == "true" || s == "false"
}

/// File frame rate from the first `<fps>N</fps> <fps>D</fps>` pair inside
/// `<streams_0>`.
fn stream_fps(xml: &str) -> Option<f64> {
    let stream = &xml[xml.find("<streams_0>")?..];
    let mut from = 0;

    while let Some(found) = stream[from..].find("<fps>") {
        let at = from + found;
        from = at + "<fps>".len();

        let Some((num, rest)) = fps_element(&stream[at..]) else {
            continue;
        };
        let Some((den, _)) = fps_element(rest.trim_start()) else {
            continue;
        };
        let (num, den) = (num.parse::<u64>().ok()?, den.parse::<u64>().ok()?);
        return if den != 0 {
            Some(num as f64 / den as f64)
        } else {
            None
        };
    }
    None
}

/// Match `<fps>digits</fps>` at the start of `s`, returning the digits and the rest.
fn fps_element(s: &str) -> Option<(&str, &str)> {
    let rest = s.strip_prefix("<fps>")?;
    let end = rest.find("</fps>")?;
    let digits = &rest[..end];
    if !is_digits(digits) {
        return None;
    }
    Some((digits, &rest[end + "</fps>".len()..]))
}

/// Parse an `INFO <channel>-<layer>` reply by pattern, not by XML schema.
///
/// The first `<time>` is the current position and the second the clip
/// length, both in seconds. Returns `None` for an empty reply.
pub fn parse_layer_status(resp: &str) -> Option<LayerStatus> {
    let lines = non_empty_lines(resp);
    let Some((status, body)) = lines.split_first() else {
        warn!("[Caspar] INFO response empty");
        return None;
    };
    debug!("[Caspar] < {}", status);

    let xml = body.join("\n");

    let clip_name = first_tag(&xml, "name", |_| true).map(str::to_string);

    let times = tag_values(&xml, "time", |s| {
        s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    });
    let current_time = times.first().and_then(|t| t.parse::<f64>().ok());
    let total_time = times.get(1).and_then(|t| t.parse::<f64>().ok());

    let looping = first_tag(&xml, "loop", is_bool).map(|v| v == "true");
    let paused = first_tag(&xml, "paused", is_bool).map(|v| v == "true");

    Some(LayerStatus {
        clip_name,
        current_time,
        total_time,
        fps: stream_fps(&xml),
        looping,
        paused,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_REPLY: &str = "201 INFO OK\r\n\
<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n\
<layer>\r\n\
  <foreground>\r\n\
    <producer>\r\n\
      <name>ffmpeg[AMB.mp4|3.0864]</name>\r\n\
      <file>\r\n\
        <time>3.0864</time>\r\n\
        <time>329.8461</time>\r\n\
        <streams_0>\r\n\
          <fps>30</fps>\r\n\
          <fps>1</fps>\r\n\
        </streams_0>\r\n\
      </file>\r\n\
      <loop>false</loop>\r\n\
    </producer>\r\n\
    <paused>true</paused>\r\n\
  </foreground>\r\n\
</layer>";

    #[test]
    fn test_parse_clip_list() {
        let resp = "200 CLS OK\r\n\
\"AMB\" MOVIE 6445960 20170413141655 268 1/25\r\n\
\"FOLDER/CG1080I50\" MOVIE 6159792 20170413141655 264 1/25\r\n\
PLAIN MOVIE 1 2 3 1/25\r\n\
   \r\n\
\"\" STILL";
        assert_eq!(
            parse_clip_list(resp),
            vec!["AMB", "FOLDER/CG1080I50", "PLAIN", "\""]
        );
    }

    #[test]
    fn test_parse_clip_list_status_only() {
        assert!(parse_clip_list("200 CLS OK").is_empty());
        assert!(parse_clip_list("").is_empty());
    }

    #[test]
    fn test_parse_clip_info_fractional_timebase() {
        let info = parse_clip_info(
            "201 CINF OK\r\n\"FNAFCOUNTDOWN\"  MOVIE  1148012508 20250124204929 35926 1001/60000\r\n",
        );
        let fps = info.fps.unwrap();
        assert!((fps - 59.94).abs() < 0.001);
        assert_eq!(info.frames, Some(35926));
        assert_eq!(info.duration.unwrap().to_string(), "00:09:58:46");
        assert_eq!(info.video_format.as_deref(), Some("1080p60"));
    }

    #[test]
    fn test_parse_clip_info_whole_rate() {
        let info = parse_clip_info("201 CINF OK\r\n\"AMB\" MOVIE 6445960 20170413141655 268 1/25\r\n");
        assert_eq!(info.fps, Some(25.0));
        assert_eq!(info.frames, Some(268));
        assert_eq!(info.duration.unwrap().to_string(), "00:00:10:18");
        assert_eq!(info.video_format.as_deref(), Some("1080p25"));
    }

    #[test]
    fn test_parse_clip_info_malformed_timebase() {
        let info = parse_clip_info("201 CINF OK\r\n\"AMB\" MOVIE 6445960 20170413141655 268 abc\r\n");
        assert_eq!(info.fps, None);
        assert_eq!(info.frames, Some(268));
        assert_eq!(info.duration, None);
        assert_eq!(info.video_format, None);

        let zero = parse_clip_info("201 CINF OK\r\n\"AMB\" MOVIE 268 0/25\r\n");
        assert_eq!(zero.fps, None);
    }

    #[test]
    fn test_parse_clip_info_too_short() {
        assert_eq!(parse_clip_info("404 CINF ERROR\r\n"), ClipInfo::default());
        assert_eq!(parse_clip_info(""), ClipInfo::default());
    }

    #[test]
    fn test_parse_layer_status() {
        let status = parse_layer_status(INFO_REPLY).unwrap();
        assert_eq!(status.clip_name.as_deref(), Some("ffmpeg[AMB.mp4|3.0864]"));
        assert_eq!(status.current_time, Some(3.0864));
        assert_eq!(status.total_time, Some(329.8461));
        assert_eq!(status.fps, Some(30.0));
        assert_eq!(status.looping, Some(false));
        assert_eq!(status.paused, Some(true));
        assert_eq!(status.timecode().unwrap().to_string(), "00:00:03:02");
    }

    #[test]
    fn test_parse_layer_status_missing_fields() {
        let status = parse_layer_status("201 INFO OK\r\n<layer><status>empty</status></layer>").unwrap();
        assert_eq!(status, LayerStatus::default());
        assert_eq!(status.timecode(), None);
    }

    #[test]
    fn test_parse_layer_status_empty() {
        assert_eq!(parse_layer_status(""), None);
        assert_eq!(parse_layer_status("\r\n"), None);
    }

    #[test]
    fn test_stream_fps_skips_unpaired_values() {
        let xml = "<streams_0><fps>x</fps><fps>50</fps>\n <fps>2</fps></streams_0>";
        assert_eq!(stream_fps(xml), Some(25.0));
        assert_eq!(stream_fps("<fps>25</fps><fps>1</fps>"), None);
    }
}
