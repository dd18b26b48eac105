//! Speakers file (YAML): real-position/gain overrides and screen
//! configuration layered onto a named BS.2051 layout before rendering.

use serde::Deserialize;

use adm_model::{Layout, PolarPosition};

#[derive(Debug, Deserialize)]
pub struct SpeakersFile {
    #[serde(default)]
    pub speakers: Vec<SpeakerOverride>,
    #[serde(default)]
    pub screen: Option<ScreenConfig>,
}

#[derive(Debug, Deserialize)]
pub struct SpeakerOverride {
    pub channel: String,
    #[serde(default)]
    pub names: Vec<String>,
    pub position: Option<PositionOverride>,
    pub gain_linear: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PositionOverride {
    pub azimuth: f64,
    pub elevation: f64,
    #[serde(default = "default_distance")]
    pub distance: f64,
}

fn default_distance() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct ScreenConfig {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub reference: Option<ScreenReference>,
}

#[derive(Debug, Deserialize)]
pub struct ScreenReference {
    pub left_azimuth: f64,
    pub right_azimuth: f64,
    pub top_elevation: f64,
    pub bottom_elevation: f64,
}

impl SpeakersFile {
    /// Apply real-position and gain overrides to `layout` in place.
    /// `screen` configuration is consumed by the Objects renderer's
    /// screen-scaling stage via `ScreenExtent`, not by the layout itself.
    pub fn apply_to(&self, layout: &mut Layout) {
        for override_entry in &self.speakers {
            let Some(idx) = layout.channel_index(&override_entry.channel) else {
                log::warn!("speakers file references unknown channel {:?}", override_entry.channel);
                continue;
            };
            if let Some(pos) = &override_entry.position {
                layout.channels[idx].real_position = PolarPosition::new(pos.azimuth, pos.elevation, pos.distance);
            }
            if let Some(gain) = override_entry.gain_linear {
                layout.channels[idx].gain = gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adm_model::Layout;

    const YAML: &str = r#"
speakers:
  - channel: M+000
    gain_linear: 0.9
  - channel: M+030
    position:
      azimuth: 35.0
      elevation: 2.0
screen:
  type: polar
  reference:
    left_azimuth: 29.0
    right_azimuth: -29.0
    top_elevation: 17.0
    bottom_elevation: -17.0
"#;

    #[test]
    fn parses_overrides_and_screen_config() {
        let file: SpeakersFile = serde_yml::from_str(YAML).unwrap();
        assert_eq!(file.speakers.len(), 2);
        assert_eq!(file.speakers[0].gain_linear, Some(0.9));
        assert!(file.speakers[1].position.is_some());
        let screen = file.screen.unwrap();
        assert_eq!(screen.kind.as_deref(), Some("polar"));
        assert_eq!(screen.reference.unwrap().left_azimuth, 29.0);
    }

    #[test]
    fn position_override_defaults_distance_to_one() {
        let file: SpeakersFile = serde_yml::from_str(
            "speakers:\n  - channel: M+030\n    position:\n      azimuth: 30.0\n      elevation: 0.0\n",
        )
        .unwrap();
        assert_eq!(file.speakers[0].position.as_ref().unwrap().distance, 1.0);
    }

    #[test]
    fn apply_to_overrides_named_channel_and_warns_on_unknown() {
        let file: SpeakersFile = serde_yml::from_str(YAML).unwrap();
        let mut layout = Layout::layout_0_5_0();
        file.apply_to(&mut layout);

        let m000 = layout.channel_index("M+000").unwrap();
        assert_eq!(layout.channels[m000].gain, 0.9);

        let m030 = layout.channel_index("M+030").unwrap();
        assert_eq!(layout.channels[m030].real_position.azimuth, 35.0);
        assert_eq!(layout.channels[m030].real_position.elevation, 2.0);
    }

    #[test]
    fn unknown_channel_is_ignored_without_panicking() {
        let file: SpeakersFile = serde_yml::from_str("speakers:\n  - channel: NOPE\n    gain_linear: 0.5\n").unwrap();
        let mut layout = Layout::layout_0_5_0();
        file.apply_to(&mut layout);
        assert!(layout.channels.iter().all(|c| c.gain == 1.0));
    }
}
