//! Nets, vias and routed tracks.
//!
//! Each archive connection is a vertex chain with a width per vertex. The
//! chain becomes host tracks through [`chain_tracks`], which joins the
//! pieces end to end and trims width transitions the way board fabrication
//! output does: the wider side is pulled back by half the width difference
//! and a bridge of the narrower width fills the gap.

use indexmap::IndexMap;
use tracing::debug;

use crate::archive::{Connection, Net, NetElementId, NetId, NetVia, PadShapeKind, Pin, Vertex};
use crate::board::{NetClass, NetCode, PcbLayer, Track, Via, ViaType};
use crate::geometry::{round, Point, Segment};

use super::error::{ImportError, ImportResult};
use super::Importer;

/// One primitive of a route, in host units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePiece {
    /// Line or arc.
    pub segment: Segment,
    /// Track width.
    pub width: i64,
    /// Locked against editing.
    pub locked: bool,
}

impl RoutePiece {
    fn to_track(self, layer: PcbLayer, net: Option<NetCode>) -> Track {
        let (start, end) = (self.segment.start(), self.segment.end());
        let mut track = if self.segment.is_arc() {
            Track::arc(start, self.segment.mid(), end, self.width, layer)
        } else {
            Track::segment(start, end, self.width, layer)
        };
        track.net = net;
        track.locked = self.locked;
        track
    }
}

/// Moves `point` towards `reference` by `offset`.
///
/// When the remaining distance would not be positive the point collapses
/// onto `reference`, leaving a zero-length track to be dropped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn apply_route_offset(point: Point, reference: Point, offset: i64) -> Point {
    let v = point - reference;
    let new_length = round(v.length()) - offset;
    if new_length > 0 {
        reference + v.resize(new_length as f64)
    } else {
        reference
    }
}

/// Turns consecutive route pieces into contiguous tracks.
///
/// Every piece starts where the previous one ended. At a width change the
/// wider side is shortened by half the difference; when that opens a gap a
/// bridge with the smaller width is inserted. Zero-length tracks are
/// dropped.
#[must_use]
pub fn chain_tracks(pieces: &[RoutePiece], layer: PcbLayer, net: Option<NetCode>) -> Vec<Track> {
    let mut tracks = Vec::with_capacity(pieces.len());
    let mut prev: Option<Track> = None;

    for piece in pieces {
        let mut track = piece.to_track(layer, net);

        if let Some(mut prev) = prev.take() {
            track.start = prev.end;

            let offset = track.width / 2 - prev.width / 2;
            if offset > 0 {
                track.start = apply_route_offset(track.start, track.end, offset);
            } else if offset < 0 {
                prev.end = apply_route_offset(prev.end, prev.start, -offset);
            }

            let bridge = (track.start != prev.end).then(|| {
                let mut bridge =
                    Track::segment(prev.end, track.start, track.width.min(prev.width), layer);
                bridge.net = net;
                bridge.locked = track.locked;
                bridge
            });
            push_track(&mut tracks, prev);
            if let Some(bridge) = bridge {
                push_track(&mut tracks, bridge);
            }
        }

        prev = Some(track);
    }

    if let Some(last) = prev {
        push_track(&mut tracks, last);
    }
    tracks
}

fn push_track(tracks: &mut Vec<Track>, track: Track) {
    if track.length() != 0.0 {
        tracks.push(track);
    }
}

/// Via construction for a span between two physical layers.
fn via_type(start: u32, end: u32, max_physical: u32) -> ViaType {
    let outer = |n: u32| n == 1 || n == max_physical;
    match (outer(start), outer(end)) {
        (true, true) => ViaType::Through,
        (false, false) => ViaType::BlindBuried,
        _ => ViaType::Micro,
    }
}

/// Net ids that mean "no net".
pub(super) fn is_unconnected(name: &str) -> bool {
    name.is_empty() || name == "NONE"
}

impl Importer<'_> {
    pub(super) fn load_nets(&mut self) -> ImportResult<()> {
        let archive = self.archive;
        let mut track_count = 0;

        for (net_id, net) in &archive.layout.nets {
            if net.pins.is_empty() && net.vias.is_empty() && net.connections.is_empty() {
                continue;
            }
            let code = self.net_code(net_id)?;
            let mut sizes: IndexMap<&NetElementId, i64> = IndexMap::new();

            for (element, via) in &net.vias {
                let size = self.load_via(net_id, via, code)?;
                sizes.insert(element, size);
            }
            for (element, pin) in &net.pins {
                let size = self.connect_pin(net_id, pin, code)?;
                sizes.insert(element, size);
            }

            for connection in &net.connections {
                if connection.unrouted {
                    continue;
                }
                let start_width = self.node_width(net, &sizes, &connection.start_node, connection);
                let end_width = self.node_width(net, &sizes, &connection.end_node, connection);
                track_count += self.load_net_tracks(connection, code, start_width, end_width);
            }
        }

        debug!(
            nets = self.nets.len(),
            tracks = track_count,
            "Nets loaded"
        );
        Ok(())
    }

    /// Host net for an archive net, created on first use.
    pub(super) fn net_code(&mut self, id: &NetId) -> ImportResult<NetCode> {
        if let Some(code) = self.nets.get(id) {
            return Ok(*code);
        }
        let archive = self.archive;
        let net = archive
            .layout
            .nets
            .get(id)
            .ok_or_else(|| ImportError::missing("net", id.as_str(), "Board item"))?;

        let name = if net.name.is_empty() {
            let pin = net
                .pins
                .values()
                .next()
                .ok_or_else(|| ImportError::UnnamedNet { id: id.to_string() })?;
            let component = archive.layout.components.get(&pin.component).ok_or_else(|| {
                ImportError::missing("component", pin.component.as_str(), format!("Net '{id}'"))
            })?;
            format!("Net-({}-Pad{})", component.name, pin.pad)
        } else {
            net.name.clone()
        };

        let class = self.net_class(net)?;
        for (kind, foreign) in [("net class", &net.net_class), ("spacing class", &net.spacing_class)]
        {
            if !is_unconnected(foreign) {
                self.diag.warn_once(kind, || {
                    format!(
                        "The design contains nets with a {kind} assigned. The {kind} has no \
                         host equivalent and was not imported; review the design rules."
                    )
                });
            }
        }

        let code = self.board.add_net(name);
        if let Some(info) = self.board.net_mut(code) {
            info.net_class = class;
        }
        self.nets.insert(id.clone(), code);
        Ok(code)
    }

    /// Host net class made from the net's route code.
    fn net_class(&mut self, net: &Net) -> ImportResult<String> {
        if let Some(name) = self.net_classes.get(&net.route_code) {
            return Ok(name.clone());
        }
        let code = self.route_code(&net.route_code, &format!("Net '{}'", net.name))?;
        let class = NetClass {
            name: code.name.clone(),
            track_width: self.shapes.units().length(code.optimal_width),
            description: String::new(),
        };
        self.board.add_net_class(class);
        self.net_classes
            .insert(net.route_code.clone(), code.name.clone());
        Ok(code.name.clone())
    }

    /// Adds a via and returns its pad size.
    fn load_via(&mut self, net_id: &NetId, via: &NetVia, net: NetCode) -> ImportResult<i64> {
        let context = format!("Via on net '{net_id}'");
        let code = self.via_code(&via.via_code, &context)?;
        let pair = self.layer_pair(&via.layer_pair, &context)?;
        let units = *self.shapes.units();

        if code.shape.kind != PadShapeKind::Circle {
            let id = via.via_code.clone();
            self.diag.warn_once(format!("via-shape:{id}"), || {
                format!("Via code '{id}' is not circular. It was imported as a circular via.")
            });
        }

        let max_physical = self.archive.technology.max_physical_layer;
        let copper = |n: u32| {
            self.layers
                .physical_copper(n, max_physical)
                .ok_or_else(|| ImportError::missing("copper layer", n.to_string(), context.as_str()))
        };
        let top_layer = copper(pair.physical_layer_start)?;
        let bottom_layer = copper(pair.physical_layer_end)?;

        let width = units.length(code.shape.size);
        self.board.add(Via {
            position: units.point(via.location),
            width,
            drill: units.length(code.drill_diameter),
            via_type: via_type(pair.physical_layer_start, pair.physical_layer_end, max_physical),
            top_layer,
            bottom_layer,
            net: Some(net),
            locked: via.fixed,
        });
        Ok(width)
    }

    /// Puts a pin's pad on the net and returns the pad's smaller extent.
    fn connect_pin(&mut self, net_id: &NetId, pin: &Pin, net: NetCode) -> ImportResult<i64> {
        let context = format!("Net '{net_id}'");
        let archive = self.archive;
        let component = archive.layout.components.get(&pin.component).ok_or_else(|| {
            ImportError::missing("component", pin.component.as_str(), context.as_str())
        })?;
        let item = *self.components.get(&pin.component).ok_or_else(|| {
            ImportError::missing("component", pin.component.as_str(), context.as_str())
        })?;
        let extra = self
            .copper_pads
            .get(&component.symdef)
            .and_then(|pads| pads.get(&pin.pad))
            .cloned()
            .unwrap_or_default();

        let footprint = self.board.footprint_mut(item).ok_or_else(|| {
            ImportError::missing("component", pin.component.as_str(), context.as_str())
        })?;
        let pad = pin
            .pad
            .index()
            .and_then(|i| footprint.pads.get_mut(i))
            .ok_or_else(|| ImportError::missing("pad", pin.pad.to_string(), context.as_str()))?;
        pad.net = Some(net);
        let size = pad.size.x.min(pad.size.y);

        for index in extra {
            if let Some(copper) = footprint.pads.get_mut(index) {
                copper.net = Some(net);
            }
        }
        Ok(size)
    }

    /// Width available at a connection end, for trimming.
    ///
    /// Pins and vias give their size. A junction gives the widest route end
    /// of the other connections that meet at it. A junction no other routed
    /// connection reaches, or a node that is neither, is unbounded
    /// (`i64::MAX`) so the end is never trimmed.
    fn node_width(
        &self,
        net: &Net,
        sizes: &IndexMap<&NetElementId, i64>,
        node: &NetElementId,
        current: &Connection,
    ) -> i64 {
        if let Some(size) = sizes.get(node) {
            return *size;
        }
        if !net.junctions.contains_key(node) {
            return i64::MAX;
        }
        let units = self.shapes.units();
        net.connections
            .iter()
            .filter(|c| !(c.start_node == current.start_node && c.end_node == current.end_node))
            .filter_map(|c| {
                let route = c.route.as_ref()?;
                let vertex = if c.start_node == *node {
                    route.vertices.first()
                } else if c.end_node == *node {
                    route.vertices.last()
                } else {
                    None
                };
                Some(units.length(vertex?.route_width))
            })
            .max()
            .unwrap_or(i64::MAX)
    }

    /// Adds the tracks of one routed connection. Returns how many were added.
    fn load_net_tracks(
        &mut self,
        connection: &Connection,
        net: NetCode,
        start_width: i64,
        end_width: i64,
    ) -> usize {
        let Some(route) = &connection.route else {
            return 0;
        };
        let (Some(first), Some(last)) = (route.vertices.first(), route.vertices.last()) else {
            return 0;
        };
        let Some(layer) = self.layers.layer(&route.layer).filter(|l| l.is_copper()) else {
            let id = route.layer.clone();
            let name = self.layer_name(&id);
            self.diag.warn_once(format!("route-layer:{id}"), || {
                format!("Routes on layer '{name}' have no host copper layer and were not imported.")
            });
            return 0;
        };
        let units = *self.shapes.units();

        let mut steps: Vec<(Vertex, i64, bool)> = Vec::with_capacity(route.vertices.len() + 2);
        if start_width < units.length(first.route_width) {
            steps.push((Vertex::Point { end: route.start_point }, start_width, first.fixed));
        }
        steps.extend(
            route
                .vertices
                .iter()
                .map(|v| (v.vertex, units.length(v.route_width), v.fixed)),
        );
        if end_width < units.length(last.route_width) {
            steps.push((Vertex::Point { end: last.vertex.end() }, end_width, last.fixed));
        }

        let mut prev_end = route.start_point;
        let pieces: Vec<RoutePiece> = steps
            .iter()
            .map(|(vertex, width, locked)| {
                let segment = self.shapes.segment(prev_end, vertex);
                prev_end = vertex.end();
                RoutePiece {
                    segment,
                    width: *width,
                    locked: *locked,
                }
            })
            .collect();

        let tracks = chain_tracks(&pieces, layer, Some(net));
        let count = tracks.len();
        for track in tracks {
            self.board.add(track);
        }
        count
    }
}
