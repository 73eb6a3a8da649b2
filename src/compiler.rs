use crate::convert::seconds_to_timestamp;
use crate::models::*;
use crate::writer::{write_xml, Node};

/// Compile a VAST model into trimmed VAST XML
pub fn compile(vast: &Vast) -> String {
    let root = Node::new("VAST")
        .attr("version", vast.version.as_ref())
        .children(vast.ads.iter().map(ad_node));

    write_xml(&root, true)
}

fn ad_node(ad: &Ad) -> Node {
    let (tag, title, description, survey, vast_ad_tag_uri) = match &ad.kind {
        AdKind::Inline(inline) => (
            "InLine",
            inline.title.as_ref(),
            inline.description.as_ref(),
            inline.survey.as_ref(),
            None,
        ),
        AdKind::Wrapper(wrapper) => ("Wrapper", None, None, None, wrapper.vast_ad_tag_uri.as_ref()),
    };

    let body = Node::new(tag)
        .child(
            Node::new("AdSystem")
                .attr("version", ad.system.version.as_ref())
                .value(ad.system.name.as_ref()),
        )
        .child(Node::new("AdTitle").value(title))
        .child(Node::new("Description").value(description))
        .child(Node::new("Survey").value(survey).cdata())
        .child(Node::new("VASTAdTagURI").value(vast_ad_tag_uri).cdata())
        .children(
            ad.errors
                .iter()
                .map(|error| Node::new("Error").value(Some(error)).cdata()),
        )
        .children(ad.impressions.iter().map(|impression| {
            Node::new("Impression")
                .attr("id", impression.id.as_ref())
                .value(impression.uri.as_ref())
                .cdata()
        }))
        .child(
            Node::new("Creatives")
                .children(ad.creatives.iter().map(creative_node))
                .required(),
        );

    Node::new("Ad").attr("id", ad.id.as_ref()).child(body)
}

fn creative_node(creative: &Creative) -> Node {
    let body = match &creative.kind {
        CreativeKind::Linear(linear) => linear_node(linear),
        CreativeKind::Companions(companions) => companions_node(companions),
        CreativeKind::NonLinear(non_linear) => non_linear_node(non_linear),
    };

    Node::new("Creative")
        .attr("id", creative.id.as_ref())
        .attr("sequence", creative.sequence.as_ref())
        .attr("AdID", creative.ad_id.as_ref())
        .child(body)
}

fn tracking_events_node(events: &[TrackingEvent]) -> Node {
    Node::new("TrackingEvents").children(events.iter().map(|event| {
        Node::new("Tracking")
            .attr("event", event.event.as_ref())
            .value(event.uri.as_ref())
            .cdata()
    }))
}

fn resource_nodes(resources: &[Resource]) -> impl Iterator<Item = Node> + '_ {
    resources.iter().map(|resource| {
        Node::new(resource.kind.tag())
            .attr("creativeType", resource.creative_type.as_ref())
            .value(resource.data.as_ref())
            .cdata()
    })
}

fn parameters_node(parameters: Option<&String>) -> Node {
    Node::new("AdParameters").value(parameters)
}

fn linear_node(linear: &Linear) -> Node {
    let mut node = Node::new("Linear")
        .child(Node::new("Duration").value(linear.duration.map(seconds_to_timestamp)))
        .child(tracking_events_node(&linear.tracking_events))
        .child(parameters_node(linear.parameters.as_ref()));

    if let Some(clicks) = &linear.video_clicks {
        node = node.child(
            Node::new("VideoClicks")
                .child(
                    Node::new("ClickThrough")
                        .value(clicks.click_through.as_ref())
                        .cdata(),
                )
                .children(
                    clicks
                        .click_trackings
                        .iter()
                        .map(|uri| Node::new("ClickTracking").value(Some(uri)).cdata()),
                )
                .children(clicks.custom_clicks.iter().map(|click| {
                    Node::new("CustomClick")
                        .attr("id", click.id.as_ref())
                        .value(click.uri.as_ref())
                        .cdata()
                })),
        );
    }

    node.child(
        Node::new("MediaFiles").children(linear.media_files.iter().map(|media_file| {
            Node::new("MediaFile")
                .attr("id", media_file.id.as_ref())
                .attr("width", media_file.width.as_ref())
                .attr("height", media_file.height.as_ref())
                .attr("bitrate", media_file.bitrate.as_ref())
                .attr("type", media_file.mime_type.as_ref())
                .attr("delivery", media_file.delivery.as_ref())
                .attr("scalable", media_file.scalable)
                .attr("maintainAspectRatio", media_file.maintain_aspect_ratio)
                .attr("apiFramework", media_file.api_framework.as_ref())
                .value(media_file.uri.as_ref())
                .cdata()
        })),
    )
}

fn companions_node(companions: &Companions) -> Node {
    Node::new("CompanionAds").children(companions.companions.iter().map(|companion| {
        Node::new("Companion")
            .attr("id", companion.id.as_ref())
            .attr("width", companion.width.as_ref())
            .attr("height", companion.height.as_ref())
            .attr("expandedWidth", companion.expanded_width.as_ref())
            .attr("expandedHeight", companion.expanded_height.as_ref())
            .attr("apiFramework", companion.api_framework.as_ref())
            .children(resource_nodes(&companion.resources))
            .child(tracking_events_node(&companion.tracking_events))
            .child(
                Node::new("CompanionClickThrough")
                    .value(companion.click_through.as_ref())
                    .cdata(),
            )
            .child(Node::new("AltText").value(companion.alt_text.as_ref()))
            .child(parameters_node(companion.parameters.as_ref()))
    }))
}

fn non_linear_node(non_linear: &NonLinear) -> Node {
    // Tracking events of the whole creative follow the last NonLinear
    Node::new("NonLinearAds")
        .children(non_linear.ads.iter().map(|ad| {
            Node::new("NonLinear")
                .attr("id", ad.id.as_ref())
                .attr("width", ad.width.as_ref())
                .attr("height", ad.height.as_ref())
                .attr("expandedWidth", ad.expanded_width.as_ref())
                .attr("expandedHeight", ad.expanded_height.as_ref())
                .attr("scalable", ad.scalable)
                .attr("maintainAspectRatio", ad.maintain_aspect_ratio)
                .attr(
                    "minSuggestedDuration",
                    ad.min_suggested_duration.map(seconds_to_timestamp),
                )
                .attr("apiFramework", ad.api_framework.as_ref())
                .children(resource_nodes(&ad.resources))
                .child(
                    Node::new("NonLinearClickThrough")
                        .value(ad.click_through.as_ref())
                        .cdata(),
                )
                .child(parameters_node(ad.parameters.as_ref()))
        }))
        .child(tracking_events_node(&non_linear.tracking_events))
}
