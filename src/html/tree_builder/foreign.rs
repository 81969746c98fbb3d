// Copyright the wordmark5 contributors. See the COPYRIGHT file at the
// top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Foreign-content support (spec §4.4's "rules for parsing tokens in
//! foreign content"): the SVG tag-name and attribute case-restoration
//! tables, the MathML attribute adjustment, and the generic
//! XLink/XML/XMLNS foreign-attribute namespace assignment. The HTML
//! tokenizer lowercases and never splits attribute names, so all three
//! tables key on the lowercase, unsplit spelling the tokenizer hands
//! the tree builder.

use crate::html::interface::{Attribute, AttrName, Namespace, NamespaceOrd};

/// SVG element names the tokenizer's lowercase spelling must be
/// restored to mixed case for (spec's "adjust SVG tag name" table).
static SVG_TAG_NAMES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "altglyph" => "altGlyph",
    "altglyphdef" => "altGlyphDef",
    "altglyphitem" => "altGlyphItem",
    "animatecolor" => "animateColor",
    "animatemotion" => "animateMotion",
    "animatetransform" => "animateTransform",
    "clippath" => "clipPath",
    "feblend" => "feBlend",
    "fecolormatrix" => "feColorMatrix",
    "fecomponenttransfer" => "feComponentTransfer",
    "fecomposite" => "feComposite",
    "feconvolvematrix" => "feConvolveMatrix",
    "fediffuselighting" => "feDiffuseLighting",
    "fedisplacementmap" => "feDisplacementMap",
    "fedistantlight" => "feDistantLight",
    "fedropshadow" => "feDropShadow",
    "feflood" => "feFlood",
    "fefunca" => "feFuncA",
    "fefuncb" => "feFuncB",
    "fefuncg" => "feFuncG",
    "fefuncr" => "feFuncR",
    "fegaussianblur" => "feGaussianBlur",
    "feimage" => "feImage",
    "femerge" => "feMerge",
    "femergenode" => "feMergeNode",
    "femorphology" => "feMorphology",
    "feoffset" => "feOffset",
    "fepointlight" => "fePointLight",
    "fespecularlighting" => "feSpecularLighting",
    "fespotlight" => "feSpotLight",
    "fetile" => "feTile",
    "feturbulence" => "feTurbulence",
    "foreignobject" => "foreignObject",
    "glyphref" => "glyphRef",
    "lineargradient" => "linearGradient",
    "radialgradient" => "radialGradient",
    "textpath" => "textPath",
};

/// SVG presentation/animation attribute names needing the same
/// case restoration (spec's "adjust SVG attributes" table).
static SVG_ATTR_NAMES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "attributename" => "attributeName",
    "attributetype" => "attributeType",
    "basefrequency" => "baseFrequency",
    "baseprofile" => "baseProfile",
    "calcmode" => "calcMode",
    "clippathunits" => "clipPathUnits",
    "diffuseconstant" => "diffuseConstant",
    "edgemode" => "edgeMode",
    "filterunits" => "filterUnits",
    "glyphref" => "glyphRef",
    "gradienttransform" => "gradientTransform",
    "gradientunits" => "gradientUnits",
    "kernelmatrix" => "kernelMatrix",
    "kernelunitlength" => "kernelUnitLength",
    "keypoints" => "keyPoints",
    "keysplines" => "keySplines",
    "keytimes" => "keyTimes",
    "lengthadjust" => "lengthAdjust",
    "limitingconeangle" => "limitingConeAngle",
    "markerheight" => "markerHeight",
    "markerunits" => "markerUnits",
    "markerwidth" => "markerWidth",
    "maskcontentunits" => "maskContentUnits",
    "maskunits" => "maskUnits",
    "numoctaves" => "numOctaves",
    "pathlength" => "pathLength",
    "patterncontentunits" => "patternContentUnits",
    "patterntransform" => "patternTransform",
    "patternunits" => "patternUnits",
    "pointsatx" => "pointsAtX",
    "pointsaty" => "pointsAtY",
    "pointsatz" => "pointsAtZ",
    "preservealpha" => "preserveAlpha",
    "preserveaspectratio" => "preserveAspectRatio",
    "primitiveunits" => "primitiveUnits",
    "refx" => "refX",
    "refy" => "refY",
    "repeatcount" => "repeatCount",
    "repeatdur" => "repeatDur",
    "requiredextensions" => "requiredExtensions",
    "requiredfeatures" => "requiredFeatures",
    "specularconstant" => "specularConstant",
    "specularexponent" => "specularExponent",
    "spreadmethod" => "spreadMethod",
    "startoffset" => "startOffset",
    "stddeviation" => "stdDeviation",
    "stitchtiles" => "stitchTiles",
    "surfacescale" => "surfaceScale",
    "systemlanguage" => "systemLanguage",
    "tablevalues" => "tableValues",
    "targetx" => "targetX",
    "targety" => "targetY",
    "textlength" => "textLength",
    "viewbox" => "viewBox",
    "viewtarget" => "viewTarget",
    "xchannelselector" => "xChannelSelector",
    "ychannelselector" => "yChannelSelector",
    "zoomandpan" => "zoomAndPan",
};

/// `prefix:local` spellings the tokenizer hands over unsplit that need
/// assigning to the XLink/XML/XMLNS namespaces (spec's "adjust foreign
/// attributes" table).
static FOREIGN_ATTR_NAMES: phf::Map<&'static str, (Namespace, &'static str, &'static str)> = phf::phf_map! {
    "xlink:actuate" => (Namespace::XLink, "xlink", "actuate"),
    "xlink:arcrole" => (Namespace::XLink, "xlink", "arcrole"),
    "xlink:href" => (Namespace::XLink, "xlink", "href"),
    "xlink:role" => (Namespace::XLink, "xlink", "role"),
    "xlink:show" => (Namespace::XLink, "xlink", "show"),
    "xlink:title" => (Namespace::XLink, "xlink", "title"),
    "xlink:type" => (Namespace::XLink, "xlink", "type"),
    "xml:lang" => (Namespace::Xml, "xml", "lang"),
    "xml:space" => (Namespace::Xml, "xml", "space"),
    "xmlns" => (Namespace::XmlNs, "", "xmlns"),
    "xmlns:xlink" => (Namespace::XmlNs, "xmlns", "xlink"),
};

/// Restore an SVG element's tag name to its mixed-case spelling, if the
/// tokenizer's lowercased form is one the SVG table renames.
pub(crate) fn adjust_svg_tag_name(local: &str) -> String {
    SVG_TAG_NAMES.get(local).map(|s| s.to_string()).unwrap_or_else(|| local.to_string())
}

/// Apply the SVG attribute case-restoration table in place.
pub(crate) fn adjust_svg_attributes(attrs: &mut [Attribute]) {
    for attr in attrs.iter_mut() {
        if let Some(&renamed) = SVG_ATTR_NAMES.get(attr.name.local.as_str()) {
            attr.name.local = renamed.to_string();
        }
    }
}

/// MathML only renames one attribute: `definitionurl` to
/// `definitionURL` (spec's "adjust MathML attributes").
pub(crate) fn adjust_mathml_attributes(attrs: &mut [Attribute]) {
    for attr in attrs.iter_mut() {
        if attr.name.local == "definitionurl" {
            attr.name.local = "definitionURL".to_string();
        }
    }
}

/// Assign the XLink/XML/XMLNS namespace and split prefix off attribute
/// names the tokenizer handed over as one unsplit, unnamespaced local
/// name (spec's "adjust foreign attributes").
pub(crate) fn adjust_foreign_attributes(attrs: &mut [Attribute]) {
    for attr in attrs.iter_mut() {
        if let Some(&(ns, prefix, local)) = FOREIGN_ATTR_NAMES.get(attr.name.local.as_str()) {
            attr.name = AttrName {
                prefix: if prefix.is_empty() { None } else { Some(prefix.to_string()) },
                ns: NamespaceOrd::from(ns),
                local: local.to_string(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(local: &str) -> Attribute {
        Attribute {
            name: AttrName { prefix: None, ns: NamespaceOrd::from(Namespace::None), local: local.to_string() },
            value: String::new(),
        }
    }

    #[test]
    fn svg_tag_name_is_restored_to_mixed_case() {
        assert_eq!(adjust_svg_tag_name("foreignobject"), "foreignObject");
        assert_eq!(adjust_svg_tag_name("rect"), "rect");
    }

    #[test]
    fn svg_attribute_case_is_restored() {
        let mut attrs = vec![attr("viewbox"), attr("fill")];
        adjust_svg_attributes(&mut attrs);
        assert_eq!(attrs[0].name.local, "viewBox");
        assert_eq!(attrs[1].name.local, "fill");
    }

    #[test]
    fn xlink_href_is_assigned_its_namespace() {
        let mut attrs = vec![attr("xlink:href")];
        adjust_foreign_attributes(&mut attrs);
        assert_eq!(attrs[0].name.ns, NamespaceOrd::from(Namespace::XLink));
        assert_eq!(attrs[0].name.local, "href");
        assert_eq!(attrs[0].name.prefix.as_deref(), Some("xlink"));
    }

    #[test]
    fn mathml_definitionurl_is_restored() {
        let mut attrs = vec![attr("definitionurl")];
        adjust_mathml_attributes(&mut attrs);
        assert_eq!(attrs[0].name.local, "definitionURL");
    }
}
