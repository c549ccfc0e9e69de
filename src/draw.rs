/*
 *  draw.rs
 *
 *  forecast-widget - precipitation at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Raster surface primitives used by the graph renderer
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    prelude::*,
    primitives::{Circle, Line, Polyline, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle},
    text::{Baseline, Text},
};

use tiny_skia::{self as skia, FillRule, Mask, PathBuilder, StrokeDash};

use crate::vframebuf::VarFrameBuf;

/// Line style: color, width and an optional (on, off) dash pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke<C> {
    pub color: C,
    pub width: u32,
    pub dash: Option<(u32, u32)>,
}

impl<C> Stroke<C> {
    pub fn solid(color: C, width: u32) -> Self {
        Self { color, width, dash: None }
    }

    pub fn dashed(color: C, width: u32, on: u32, off: u32) -> Self {
        Self { color, width, dash: Some((on, off)) }
    }
}

/// Fixed-size 2D drawing target. The graph renderer needs nothing more.
pub trait RasterSurface {
    type Color: PixelColor;
    type Error;

    fn size(&self) -> Size;

    fn fill_rect(&mut self, rect: Rectangle, color: Self::Color) -> Result<(), Self::Error>;

    fn line(&mut self, start: Point, end: Point, stroke: Stroke<Self::Color>) -> Result<(), Self::Error>;

    /// Closed path through `points`, filled and/or outlined.
    fn path(
        &mut self,
        points: &[Point],
        fill: Option<Self::Color>,
        outline: Option<Stroke<Self::Color>>,
    ) -> Result<(), Self::Error>;

    /// Small filled circle centred on `center`.
    fn marker(&mut self, center: Point, diameter: u32, color: Self::Color) -> Result<(), Self::Error>;

    /// Text with its baseline at `position.y`.
    fn text(&mut self, text: &str, position: Point, color: Self::Color) -> Result<(), Self::Error>;
}

impl<C: PixelColor> RasterSurface for VarFrameBuf<C> {
    type Color = C;
    type Error = core::convert::Infallible;

    fn size(&self) -> Size {
        OriginDimensions::size(self)
    }

    fn fill_rect(&mut self, rect: Rectangle, color: C) -> Result<(), Self::Error> {
        draw_rect_with_style(self, rect, PrimitiveStyle::with_fill(color))
    }

    fn line(&mut self, start: Point, end: Point, stroke: Stroke<C>) -> Result<(), Self::Error> {
        match stroke.dash {
            Some((on, off)) => draw_dashed_line(self, start, end, stroke.color, stroke.width, on, off),
            None => draw_line(self, start, end, stroke.color, stroke.width),
        }
    }

    fn path(&mut self, points: &[Point], fill: Option<C>, outline: Option<Stroke<C>>) -> Result<(), Self::Error> {
        if let Some(color) = fill {
            fill_polygon(self, points, color)?;
        }
        if let Some(stroke) = outline {
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                draw_polyline(self, points, stroke.color, stroke.width)?;
                self.line(*last, *first, stroke)?;
            }
        }
        Ok(())
    }

    fn marker(&mut self, center: Point, diameter: u32, color: C) -> Result<(), Self::Error> {
        draw_circle_from_center(self, center, diameter, PrimitiveStyle::with_fill(color))
    }

    fn text(&mut self, text: &str, position: Point, color: C) -> Result<(), Self::Error> {
        draw_text(self, text, position, color)
    }
}

pub fn draw_line<D, C>(
    target: &mut D,
    start: Point,
    end: Point,
    color: C,
    width: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    Line::new(start, end)
        .into_styled(PrimitiveStyleBuilder::new().stroke_width(width).stroke_color(color).build())
        .draw(target)
}

/// Line broken into `on` pixel dashes separated by `off` pixel gaps,
/// dashed and stroked by tiny-skia.
pub fn draw_dashed_line<D, C>(
    target: &mut D,
    start: Point,
    end: Point,
    color: C,
    width: u32,
    on: u32,
    off: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    if on == 0 || start == end {
        return draw_line(target, start, end, color, width);
    }
    // the segment runs through pixel centres
    let centre = |p: Point| (p.x as f32 + 0.5, p.y as f32 + 0.5);
    let mut pb = PathBuilder::new();
    let (x, y) = centre(start);
    pb.move_to(x, y);
    let (x, y) = centre(end);
    pb.line_to(x, y);

    let stroke = skia::Stroke { width: width.max(1) as f32, ..Default::default() };
    let outline = pb
        .finish()
        .zip(StrokeDash::new(vec![on as f32, off as f32], 0.0))
        .and_then(|(path, dash)| path.dash(&dash, 1.0))
        .and_then(|dashed| dashed.stroke(&stroke, 1.0));
    match outline {
        Some(outline) => fill_coverage(target, &outline, color),
        None => Ok(()),
    }
}

pub fn draw_polyline<D, C>(
    target: &mut D,
    points: &[Point],
    color: C,
    width: u32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    Polyline::new(points)
        .into_styled(PrimitiveStyle::with_stroke(color, width))
        .draw(target)
}

/// Even-odd fill of the closed polygon through `points`. Vertices sit on
/// pixel corners, so a pixel is covered when its centre is inside.
pub fn fill_polygon<D, C>(target: &mut D, points: &[Point], color: C) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    let [first, rest @ ..] = points else {
        return Ok(());
    };
    if rest.len() < 2 {
        return Ok(());
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    match pb.finish() {
        Some(path) => fill_coverage_with(target, &path, FillRule::EvenOdd, color),
        None => Ok(()),
    }
}

fn fill_coverage<D, C>(target: &mut D, path: &skia::Path, color: C) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    fill_coverage_with(target, path, FillRule::Winding, color)
}

/// Rasterizes `path` into an aliased mask the size of the target and
/// paints every covered pixel.
fn fill_coverage_with<D, C>(target: &mut D, path: &skia::Path, rule: FillRule, color: C) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    let area = target.bounding_box();
    let Some(mut mask) = Mask::new(area.size.width, area.size.height) else {
        return Ok(());
    };
    let origin = area.top_left;
    mask.fill_path(
        path,
        rule,
        false,
        skia::Transform::from_translate(-origin.x as f32, -origin.y as f32),
    );

    let width = mask.width() as usize;
    target.draw_iter(
        mask.data()
            .iter()
            .enumerate()
            .filter(|(_, coverage)| **coverage >= 0x80)
            .map(|(i, _)| Pixel(origin + Point::new((i % width) as i32, (i / width) as i32), color)),
    )
}

pub fn draw_text<D, C>(target: &mut D, text: &str, position: Point, color: C) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    Text::with_baseline(text, position, MonoTextStyle::new(&FONT_6X10, color), Baseline::Alphabetic)
        .draw(target)?;
    Ok(())
}

pub fn draw_circle_from_center<D, C>(
    target: &mut D,
    center: Point,
    diameter: u32,
    style: PrimitiveStyle<C>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    Circle::with_center(center, diameter)
        .into_styled(style)
        .draw(target)
}

pub fn draw_rect_with_style<D, C>(
    target: &mut D,
    rect: Rectangle,
    style: PrimitiveStyle<C>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = C>,
    C: PixelColor,
{
    rect.into_styled(style).draw(target)
}
