//! Canvas2D painter
//!
//! Cosmetic only; nothing here feeds back into gameplay.

use web_sys::CanvasRenderingContext2d;

use crate::consts::*;
use crate::sim::{GamePhase, GameState, Tier};

/// Asteroid fill color per difficulty tier
fn tier_color(tier: Tier) -> &'static str {
    match tier {
        Tier::Easy => "#8BC34A",
        Tier::Medium => "#FF9800",
        Tier::Hard => "#F44336",
    }
}

/// Paint one frame
pub fn draw(ctx: &CanvasRenderingContext2d, state: &GameState, shake_enabled: bool) {
    ctx.set_fill_style_str("#0c0c2e");
    ctx.fill_rect(0.0, 0.0, FIELD_WIDTH as f64, FIELD_HEIGHT as f64);

    if state.phase == GamePhase::Menu {
        return;
    }

    ctx.save();
    if shake_enabled && state.screen_shake > 0.0 {
        // Alternate the jolt direction by tick parity
        let amp = (state.screen_shake * 5.0) as f64;
        let sign = if state.time_ticks.is_multiple_of(2) {
            1.0
        } else {
            -1.0
        };
        ctx.translate(amp * sign, amp * -sign).ok();
    }

    draw_stars(ctx);
    draw_asteroids(ctx, state);
    draw_particles(ctx, state);
    draw_laser(ctx, state);
    draw_ship(ctx, state);

    ctx.restore();
}

/// Fixed starfield (hash grid, no RNG)
fn draw_stars(ctx: &CanvasRenderingContext2d) {
    ctx.set_fill_style_str("white");
    for i in 0..50u32 {
        let x = f64::from((i * 37) % FIELD_WIDTH as u32);
        let y = f64::from((i * 23) % FIELD_HEIGHT as u32);
        ctx.fill_rect(x, y, 1.0, 1.0);
    }
}

fn draw_ship(ctx: &CanvasRenderingContext2d, state: &GameState) {
    let x = f64::from(state.ship.x);
    let y = f64::from(SHIP_Y);
    let half_w = f64::from(SHIP_WIDTH) / 2.0;
    let h = f64::from(SHIP_HEIGHT);

    ctx.set_fill_style_str("#4facfe");
    ctx.begin_path();
    ctx.move_to(x, y);
    ctx.line_to(x - half_w, y + h);
    ctx.line_to(x + half_w, y + h);
    ctx.close_path();
    ctx.fill();

    ctx.set_stroke_style_str("#64b5f6");
    ctx.set_line_width(2.0);
    ctx.stroke();
}

fn draw_asteroids(ctx: &CanvasRenderingContext2d, state: &GameState) {
    let color = tier_color(state.tier());
    for asteroid in &state.asteroids {
        let x = f64::from(asteroid.pos.x);
        let y = f64::from(asteroid.pos.y);

        ctx.set_fill_style_str(color);
        ctx.fill_rect(x - 40.0, y - 20.0, 80.0, 40.0);

        ctx.set_fill_style_str("white");
        ctx.set_font("bold 20px Arial");
        ctx.set_text_align("center");
        ctx.fill_text(&asteroid.value.to_string(), x, y + 7.0).ok();
    }
}

fn draw_particles(ctx: &CanvasRenderingContext2d, state: &GameState) {
    ctx.set_fill_style_str("#ffff00");
    for particle in &state.particles {
        ctx.fill_rect(
            f64::from(particle.pos.x),
            f64::from(particle.pos.y),
            2.0,
            2.0,
        );
    }
}

fn draw_laser(ctx: &CanvasRenderingContext2d, state: &GameState) {
    let Some(laser) = &state.laser else {
        return;
    };

    ctx.set_stroke_style_str("#00ffff");
    ctx.set_line_width(3.0);
    ctx.begin_path();
    ctx.move_to(f64::from(state.ship.x), f64::from(SHIP_Y));
    ctx.line_to(f64::from(laser.target.x), f64::from(laser.target.y));
    ctx.stroke();

    // Bright core
    ctx.set_stroke_style_str("#ffffff");
    ctx.set_line_width(1.0);
    ctx.stroke();
}
