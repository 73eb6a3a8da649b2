use crate::convert::{numberify, string_to_boolean, timestamp_to_seconds};
use crate::error::{Result, VastError};
use crate::models::*;
use crate::xml::{XmlDocument, XmlNode};

/// Parse a VAST XML string into a Vast struct
///
/// Fails when the text does not contain a `VAST` element, with the offending
/// input embedded in the error message.
pub fn parse_vast(xml: &str) -> Result<Vast> {
    let document = XmlDocument::parse(xml)?;

    let Some(root) = document.find("VAST").into_iter().next() else {
        return Err(VastError::InvalidDocument(xml.to_string()));
    };

    let ads = root
        .find("Ad")
        .into_iter()
        .enumerate()
        .map(|(index, ad)| parse_ad(index, ad))
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Parsed VAST document with {} ad(s)", ads.len());

    Ok(Vast {
        version: root.attribute("version").map(str::to_owned),
        ads,
    })
}

/// Text of a node, if the node exists and has no element children
fn value(node: Option<&XmlNode>) -> Option<String> {
    node.and_then(XmlNode::value).map(str::to_owned)
}

fn attribute(node: &XmlNode, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_owned)
}

/// Parse a single Ad element
fn parse_ad(index: usize, ad: &XmlNode) -> Result<Ad> {
    // The concrete type comes from whichever of Wrapper/InLine is present
    let kind = match ad.first("Wrapper,InLine").map(XmlNode::tag) {
        Some("InLine") => AdKind::Inline(parse_inline(ad)),
        Some(_) => AdKind::Wrapper(parse_wrapper(ad)),
        None => {
            return Err(VastError::MissingField(format!(
                "ads[{}] has neither InLine nor Wrapper",
                index
            )));
        }
    };

    let ad_system = ad.first("AdSystem");

    let creatives = ad
        .find("Creative")
        .into_iter()
        .enumerate()
        .map(|(position, creative)| parse_creative(index, position, creative))
        .collect::<Result<Vec<_>>>()?;

    Ok(Ad {
        id: attribute(ad, "id"),
        system: AdSystem {
            name: value(ad_system),
            version: ad_system.and_then(|system| attribute(system, "version")),
        },
        errors: ad
            .find("Error")
            .into_iter()
            .filter_map(|error| error.value().map(str::to_owned))
            .collect(),
        impressions: ad
            .find("Impression")
            .into_iter()
            .map(|impression| Impression {
                uri: impression.value().map(str::to_owned),
                id: attribute(impression, "id"),
            })
            .collect(),
        creatives,
        kind,
    })
}

/// Parse the InLine-only fields of an ad
fn parse_inline(ad: &XmlNode) -> Inline {
    Inline {
        title: value(ad.first("AdTitle")),
        description: value(ad.first("Description")),
        survey: value(ad.first("Survey")),
    }
}

/// Parse the Wrapper-only fields of an ad
fn parse_wrapper(ad: &XmlNode) -> Wrapper {
    Wrapper {
        vast_ad_tag_uri: value(ad.first("VASTAdTagURI")),
    }
}

/// Parse Creative element
fn parse_creative(ad_index: usize, index: usize, creative: &XmlNode) -> Result<Creative> {
    let kind = match creative
        .first("Linear,CompanionAds,NonLinearAds")
        .map(XmlNode::tag)
    {
        Some("Linear") => CreativeKind::Linear(parse_linear(creative)),
        Some("CompanionAds") => CreativeKind::Companions(parse_companions(creative)),
        Some(_) => CreativeKind::NonLinear(parse_non_linear(creative)),
        None => {
            return Err(VastError::MissingField(format!(
                "ads[{}].creatives[{}] has neither Linear, CompanionAds nor NonLinearAds",
                ad_index, index
            )));
        }
    };

    Ok(Creative {
        id: attribute(creative, "id"),
        sequence: numberify(creative.attribute("sequence")),
        ad_id: attribute(creative, "AdID"),
        kind,
    })
}

/// Parse every Tracking element below `node`
fn parse_tracking_events(node: &XmlNode) -> Vec<TrackingEvent> {
    node.find("Tracking")
        .into_iter()
        .map(|tracking| TrackingEvent {
            event: attribute(tracking, "event"),
            uri: tracking.value().map(str::to_owned),
        })
        .collect()
}

/// Parse the Static/IFrame/HTML resources below `node`
fn parse_resources(node: &XmlNode) -> Vec<Resource> {
    node.find("StaticResource,IFrameResource,HTMLResource")
        .into_iter()
        .filter_map(|resource| {
            Some(Resource {
                kind: ResourceType::from_tag(resource.tag())?,
                creative_type: attribute(resource, "creativeType"),
                data: resource.value().map(str::to_owned),
            })
        })
        .collect()
}

/// Parse Linear element
fn parse_linear(creative: &XmlNode) -> Linear {
    let video_clicks = creative.first("VideoClicks").map(|clicks| VideoClicks {
        click_through: value(clicks.first("ClickThrough")),
        click_trackings: clicks
            .find("ClickTracking")
            .into_iter()
            .filter_map(|tracking| tracking.value().map(str::to_owned))
            .collect(),
        custom_clicks: clicks
            .find("CustomClick")
            .into_iter()
            .map(|click| CustomClick {
                id: attribute(click, "id"),
                uri: click.value().map(str::to_owned),
            })
            .collect(),
    });

    Linear {
        duration: creative
            .first("Duration")
            .and_then(XmlNode::value)
            .and_then(timestamp_to_seconds),
        tracking_events: parse_tracking_events(creative),
        parameters: value(creative.first("AdParameters")),
        video_clicks,
        media_files: creative
            .find("MediaFile")
            .into_iter()
            .map(parse_media_file)
            .collect(),
    }
}

/// Parse MediaFile element
fn parse_media_file(media_file: &XmlNode) -> MediaFile {
    MediaFile {
        id: attribute(media_file, "id"),
        delivery: attribute(media_file, "delivery"),
        mime_type: attribute(media_file, "type"),
        uri: media_file.value().map(str::to_owned),
        bitrate: numberify(media_file.attribute("bitrate")),
        width: numberify(media_file.attribute("width")),
        height: numberify(media_file.attribute("height")),
        scalable: string_to_boolean(media_file.attribute("scalable")),
        maintain_aspect_ratio: string_to_boolean(media_file.attribute("maintainAspectRatio")),
        api_framework: attribute(media_file, "apiFramework"),
    }
}

/// Parse CompanionAds element
fn parse_companions(creative: &XmlNode) -> Companions {
    let companions = creative
        .find("Companion")
        .into_iter()
        .map(|companion| Companion {
            id: attribute(companion, "id"),
            width: numberify(companion.attribute("width")),
            height: numberify(companion.attribute("height")),
            expanded_width: numberify(companion.attribute("expandedWidth")),
            expanded_height: numberify(companion.attribute("expandedHeight")),
            api_framework: attribute(companion, "apiFramework"),
            resources: parse_resources(companion),
            tracking_events: parse_tracking_events(companion),
            click_through: value(companion.first("CompanionClickThrough")),
            alt_text: value(companion.first("AltText")),
            parameters: value(companion.first("AdParameters")),
        })
        .collect();

    Companions { companions }
}

/// Parse NonLinearAds element
fn parse_non_linear(creative: &XmlNode) -> NonLinear {
    let ads = creative
        .find("NonLinear")
        .into_iter()
        .map(|ad| NonLinearAd {
            id: attribute(ad, "id"),
            width: numberify(ad.attribute("width")),
            height: numberify(ad.attribute("height")),
            expanded_width: numberify(ad.attribute("expandedWidth")),
            expanded_height: numberify(ad.attribute("expandedHeight")),
            scalable: string_to_boolean(ad.attribute("scalable")),
            maintain_aspect_ratio: string_to_boolean(ad.attribute("maintainAspectRatio")),
            min_suggested_duration: ad
                .attribute("minSuggestedDuration")
                .and_then(timestamp_to_seconds),
            api_framework: attribute(ad, "apiFramework"),
            resources: parse_resources(ad),
            click_through: value(ad.first("NonLinearClickThrough")),
            parameters: value(ad.first("AdParameters")),
        })
        .collect();

    NonLinear {
        ads,
        tracking_events: parse_tracking_events(creative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Number;

    const FULL: &str = include_str!("../tests/fixtures/vast_2.0.xml");
    const MINIMAL: &str = include_str!("../tests/fixtures/minimal.xml");

    #[test]
    fn rejects_non_vast_input() {
        let error = parse_vast("foo bar").unwrap_err();
        assert!(error.is_format_error());
        assert_eq!(error.to_string(), "[foo bar] is not a valid VAST document.");
    }

    #[test]
    fn parses_minimal_document() {
        let vast = parse_vast(MINIMAL).unwrap();

        assert_eq!(vast.version.as_deref(), Some("2.0"));
        assert_eq!(vast.ads.len(), 2);
        assert_eq!(vast.ads[0].id.as_deref(), Some("229"));
        assert_eq!(vast.ads[0].kind.ad_type(), AdType::Inline);
        assert_eq!(vast.ads[1].kind.ad_type(), AdType::Wrapper);

        match &vast.ads[0].creatives[0].kind {
            CreativeKind::Linear(linear) => {
                assert_eq!(linear.duration, Some(11));
                assert_eq!(linear.media_files.len(), 1);
            }
            other => panic!("expected a linear creative, got {:?}", other),
        }
    }

    #[test]
    fn parses_inline_fields() {
        let vast = parse_vast(FULL).unwrap();
        let ad = &vast.ads[0];

        assert_eq!(ad.system.name.as_deref(), Some("Acudeo Compatible"));
        assert_eq!(ad.system.version.as_deref(), Some("1.0"));
        assert_eq!(ad.errors, vec!["http://myErrorURL/error".to_string()]);
        assert_eq!(ad.impressions.len(), 2);
        assert_eq!(ad.impressions[1].id.as_deref(), Some("second"));
        assert_eq!(
            ad.kind,
            AdKind::Inline(Inline {
                title: Some("VAST 2.0 Instream Test 1".to_string()),
                description: Some("VAST 2.0 Instream Test 1".to_string()),
                survey: Some("http://mySurveyURL/survey".to_string()),
            })
        );
    }

    #[test]
    fn parses_linear_creative() {
        let vast = parse_vast(FULL).unwrap();
        let creative = &vast.ads[0].creatives[0];

        assert_eq!(creative.sequence, Some(Number::from(1)));
        assert_eq!(creative.ad_id.as_deref(), Some("601364"));

        let CreativeKind::Linear(linear) = &creative.kind else {
            panic!("expected a linear creative");
        };
        assert_eq!(linear.duration, Some(30));
        assert_eq!(linear.tracking_events.len(), 3);
        assert_eq!(linear.tracking_events[1].event.as_deref(), Some("start"));
        assert_eq!(linear.parameters.as_deref(), Some("param=1"));

        let clicks = linear.video_clicks.as_ref().unwrap();
        assert_eq!(clicks.click_through.as_deref(), Some("http://www.tremormedia.com"));
        assert_eq!(clicks.click_trackings, vec!["http://myTrackingURL/click".to_string()]);
        assert_eq!(clicks.custom_clicks[0].id.as_deref(), Some("custom"));

        let media_file = &linear.media_files[0];
        assert_eq!(media_file.mime_type.as_deref(), Some("video/x-flv"));
        assert_eq!(media_file.bitrate, Some(Number::from(500)));
        assert_eq!(media_file.width, Some(Number::from(400)));
        assert_eq!(media_file.scalable, Some(true));
        assert_eq!(media_file.maintain_aspect_ratio, Some(false));
        assert_eq!(media_file.api_framework, None);
    }

    #[test]
    fn parses_companion_and_non_linear_creatives() {
        let vast = parse_vast(FULL).unwrap();
        let creatives = &vast.ads[0].creatives;

        let CreativeKind::Companions(companions) = &creatives[1].kind else {
            panic!("expected companions");
        };
        let companion = &companions.companions[0];
        assert_eq!(companion.width, Some(Number::from(300)));
        assert_eq!(companion.resources[0].kind, ResourceType::Static);
        assert_eq!(companion.resources[0].creative_type.as_deref(), Some("image/jpeg"));
        assert_eq!(companion.tracking_events.len(), 1);
        assert_eq!(companion.alt_text.as_deref(), Some("Blistex"));
        assert_eq!(companions.companions[1].resources[0].kind, ResourceType::Iframe);

        let CreativeKind::NonLinear(non_linear) = &creatives[2].kind else {
            panic!("expected non-linear ads");
        };
        let ad = &non_linear.ads[0];
        assert_eq!(ad.min_suggested_duration, Some(15));
        assert_eq!(ad.scalable, Some(true));
        assert_eq!(ad.resources[0].kind, ResourceType::Html);
        assert_eq!(ad.resources[0].data.as_deref(), Some("<p>Overlay</p>"));
        assert_eq!(ad.click_through.as_deref(), Some("http://www.tremormedia.com/overlay"));
        assert_eq!(non_linear.tracking_events.len(), 1);
    }

    #[test]
    fn malformed_timestamps_leave_duration_unset() {
        let xml = r#"<VAST version="2.0"><Ad><InLine><Creatives><Creative><Linear>
            <Duration>30 seconds</Duration></Linear></Creative></Creatives></InLine></Ad></VAST>"#;
        let vast = parse_vast(xml).unwrap();

        let CreativeKind::Linear(linear) = &vast.ads[0].creatives[0].kind else {
            panic!("expected a linear creative");
        };
        assert_eq!(linear.duration, None);
    }

    #[test]
    fn numeric_attributes_keep_fractions_and_signs() {
        let xml = r#"<VAST version="2.0"><Ad><InLine><Creatives><Creative sequence="1.5"><Linear>
            <Duration>00:00:00</Duration>
            <MediaFiles><MediaFile width="56.82" height="-2" bitrate="0.5" type="video/mp4"><![CDATA[http://x/v.mp4]]></MediaFile></MediaFiles>
            </Linear></Creative></Creatives></InLine></Ad></VAST>"#;
        let vast = parse_vast(xml).unwrap();
        let creative = &vast.ads[0].creatives[0];

        assert_eq!(creative.sequence, Number::from_f64(1.5));
        let CreativeKind::Linear(linear) = &creative.kind else {
            panic!("expected a linear creative");
        };
        // A zero-length duration is kept as a value; validation rejects it later
        assert_eq!(linear.duration, Some(0));
        let media_file = &linear.media_files[0];
        assert_eq!(media_file.width, Number::from_f64(56.82));
        assert_eq!(media_file.height, Some(Number::from(-2)));
        assert_eq!(media_file.bitrate, Number::from_f64(0.5));
    }

    #[test]
    fn missing_ad_type_is_an_error() {
        let xml = r#"<VAST version="2.0"><Ad id="1"><AdSystem>x</AdSystem></Ad></VAST>"#;
        assert!(matches!(parse_vast(xml), Err(VastError::MissingField(_))));
    }
}
