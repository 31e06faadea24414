use maze_engine::{
    text_width, Camera, Color, DrawCommand, DrawList, PixelRect, SpriteFlip, SpriteRef, TileLayer,
    TmxMap,
};

use super::collectible::ItemKind;
use super::enemy::{EnemyState, Species};
use super::game::{Game, RenderItem, RenderKind};
use super::player::{Facing, KeyKind, PlayerState};
use super::trap::TrapKind;
use super::{PLAYER_HEIGHT, PLAYER_WIDTH, TILE_SIZE};
use crate::app::menu::{MenuList, NAVIGATION_HINT};

const MAP_LAYER_ORDER: [&str; 3] = ["Background", "Collision", "Decorations"];
const WORLD_BACKGROUND: Color = Color::rgb(20, 15, 25);
const WALL_PLACEHOLDER: Color = Color::rgb(70, 60, 80);
const ITEM_SPRITE_ROOT: &str = "assets/2D Pixel Dungeon Asset Pack/items and trap_animation";

const PLAYER_FRAME_PX: i32 = 40;
const ENEMY_FRAME_PX: i32 = 32;
const ENEMY_SPRITE_SCALE: f32 = 1.5;
const ENEMY_HP_BAR_WIDTH: f32 = 30.0;
const ENEMY_HP_BAR_HEIGHT: f32 = 4.0;
const ENEMY_HP_BAR_OFFSET: f32 = 8.0;

const HUD_SCALE: i32 = 2;
const TITLE_SCALE: i32 = 6;
const HUD_BAR: PixelRect = PixelRect::new(10, 35, 200, 20);
const HP_BACK: Color = Color::rgb(100, 0, 0);
const HP_FILL: Color = Color::rgb(0, 200, 0);
const GOLD: Color = Color::rgb(255, 215, 0);
const SILVER: Color = Color::rgb(192, 192, 192);
const CONTROLS_HINT: &str = "WASD/Arrows: Move | SPACE: Attack | ESC: Pause";

/// Turns the current game state into screen-space draw commands.
pub(crate) fn build_frame(game: &Game, draw_list: &mut DrawList) {
    let camera = game.camera();
    let (viewport_w, viewport_h) = camera.viewport_size();
    let (width, height) = (viewport_w as i32, viewport_h as i32);

    draw_list.clear_to(Color::BLACK);
    draw_list.fill_rect(PixelRect::new(0, 0, width, height), WORLD_BACKGROUND);

    let level = game.level();
    draw_map(&level.map, game, draw_list);
    for item in game.render_items() {
        draw_item(&level.map, camera, &item, draw_list);
    }
    draw_fog(game, draw_list);
    if !game.is_paused() {
        draw_messages(game, draw_list);
    }
    draw_hud(game, draw_list, width, height);

    if game.is_paused() {
        draw_pause_overlay(game.pause_menu(), draw_list, width, height);
    } else if game.is_victory() {
        draw_result_overlay(
            "VICTORY!",
            Color::rgb(120, 255, 120),
            Color::rgba(0, 60, 0, 200),
            game.player().score,
            game.victory_menu(),
            draw_list,
            (width, height),
        );
    } else if game.is_game_over() {
        draw_result_overlay(
            "GAME OVER",
            Color::rgb(255, 80, 80),
            Color::rgba(60, 0, 0, 200),
            game.player().score,
            game.game_over_menu(),
            draw_list,
            (width, height),
        );
    }
}

fn screen_rect(camera: &Camera, x: f32, y: f32, w: f32, h: f32) -> PixelRect {
    let (sx, sy, sw, sh) = camera.apply(x, y, w, h);
    PixelRect::from_world(sx, sy, sw.ceil(), sh.ceil())
}

fn layers_to_draw(map: &TmxMap) -> Vec<&TileLayer> {
    let named: Vec<_> = MAP_LAYER_ORDER
        .iter()
        .filter_map(|name| map.tile_layer(name))
        .collect();
    if named.is_empty() {
        map.tile_layers.iter().filter(|layer| layer.visible).collect()
    } else {
        named
    }
}

fn draw_map(map: &TmxMap, game: &Game, draw_list: &mut DrawList) {
    let camera = game.camera();
    let animator = &game.level().animator;
    let tile_w = map.tile_width.max(1) as f32;
    let tile_h = map.tile_height.max(1) as f32;
    let (visible_w, visible_h) = camera.visible_world_size();
    let start_col = (camera.position.x / tile_w).max(0.0) as u32;
    let start_row = (camera.position.y / tile_h).max(0.0) as u32;
    let end_col = (((camera.position.x + visible_w) / tile_w) as u32 + 1).min(map.width);
    let end_row = (((camera.position.y + visible_h) / tile_h) as u32 + 1).min(map.height);

    for layer in layers_to_draw(map) {
        // Walls stay visible when the tileset image is missing.
        let placeholder = (layer.name == "Collision").then_some(WALL_PLACEHOLDER);
        for row in start_row..end_row {
            for col in start_col..end_col {
                let raw_gid = layer.raw_gid_at(col, row);
                if raw_gid == 0 {
                    continue;
                }
                let dest = screen_rect(
                    camera,
                    col as f32 * tile_w,
                    row as f32 * tile_h,
                    tile_w,
                    tile_h,
                );
                match map.tile_image(animator.current_gid(raw_gid)) {
                    Some(image) => draw_list.sprite(
                        SpriteRef::region(image.path, image.source).flipped(image.flip),
                        dest,
                        placeholder,
                    ),
                    None => {
                        if let Some(color) = placeholder {
                            draw_list.fill_rect(dest, color);
                        }
                    }
                }
            }
        }
    }
}

fn draw_item(map: &TmxMap, camera: &Camera, item: &RenderItem, draw_list: &mut DrawList) {
    let (x, y) = (item.position.x, item.position.y);
    let (w, h) = (item.size.x, item.size.y);
    match item.kind {
        RenderKind::Door { gid } => {
            draw_tile_object(map, gid, screen_rect(camera, x, y, w, h), Color::rgb(139, 69, 19), draw_list);
        }
        RenderKind::Ladder { gid } => {
            draw_tile_object(map, gid, screen_rect(camera, x, y, w, h), Color::rgb(160, 120, 60), draw_list);
        }
        RenderKind::Trap { kind, frame } => {
            draw_list.sprite(
                SpriteRef::whole(trap_sprite(kind, frame)),
                screen_rect(camera, x, y, w, h),
                Some(Color::rgb(200, 50, 50)),
            );
        }
        RenderKind::Collectible { kind, key, frame } => {
            draw_list.sprite(
                SpriteRef::whole(collectible_sprite(kind, key, frame)),
                screen_rect(camera, x, y, w, h),
                Some(collectible_color(kind)),
            );
        }
        RenderKind::Enemy {
            species,
            state,
            frame,
            facing_left,
            hp,
            max_hp,
        } => {
            let size = ENEMY_FRAME_PX as f32 * ENEMY_SPRITE_SCALE;
            let render_x = x - (size - w) / 2.0;
            let render_y = y - (size - h);
            let source = PixelRect::new(frame as i32 * ENEMY_FRAME_PX, 0, ENEMY_FRAME_PX, ENEMY_FRAME_PX);
            let flip = SpriteFlip {
                horizontal: facing_left,
                ..SpriteFlip::default()
            };
            draw_list.sprite(
                SpriteRef::region(enemy_sprite(species, state), source).flipped(flip),
                screen_rect(camera, render_x, render_y, size, size),
                Some(Color::rgb(180, 40, 40)),
            );
            if hp < max_hp && max_hp > 0 {
                let bar_y = render_y - ENEMY_HP_BAR_OFFSET;
                let ratio = hp.max(0) as f32 / max_hp as f32;
                draw_list.fill_rect(
                    screen_rect(camera, render_x, bar_y, ENEMY_HP_BAR_WIDTH, ENEMY_HP_BAR_HEIGHT),
                    HP_BACK,
                );
                draw_list.fill_rect(
                    screen_rect(camera, render_x, bar_y, ENEMY_HP_BAR_WIDTH * ratio, ENEMY_HP_BAR_HEIGHT),
                    HP_FILL,
                );
            }
        }
        RenderKind::Player {
            state,
            facing,
            frame,
        } => {
            let size = PLAYER_FRAME_PX as f32;
            let render_x = x - (size - PLAYER_WIDTH as f32) / 2.0;
            let render_y = y - (size - PLAYER_HEIGHT as f32);
            let source = PixelRect::new(frame as i32 * PLAYER_FRAME_PX, 0, PLAYER_FRAME_PX, PLAYER_FRAME_PX);
            draw_list.sprite(
                SpriteRef::region(player_sprite(state, facing), source),
                screen_rect(camera, render_x, render_y, size, size),
                Some(Color::rgb(60, 120, 220)),
            );
        }
    }
}

fn draw_tile_object(map: &TmxMap, gid: u32, dest: PixelRect, fallback: Color, draw_list: &mut DrawList) {
    match map.tile_image(gid) {
        Some(image) => draw_list.sprite(
            SpriteRef::region(image.path, image.source).flipped(image.flip),
            dest,
            Some(fallback),
        ),
        None => draw_list.fill_rect(dest, fallback),
    }
}

fn player_sprite(state: PlayerState, facing: Facing) -> String {
    let kind = state.name();
    format!("assets/RPG_Hero/{kind}/{kind}_{}_40x40.png", facing.name())
}

fn enemy_sprite(species: Species, state: EnemyState) -> String {
    let sheet = match (species, state.sheet_name()) {
        // The shipped skeleton2 movement sheet is misnamed.
        (Species::Skeleton2, "movement") => "movemen",
        (_, sheet) => sheet,
    };
    format!(
        "assets/Enemy_Animations_Set/enemies-{}_{sheet}.png",
        species.name()
    )
}

fn trap_sprite(kind: TrapKind, frame: usize) -> String {
    let name = kind.name();
    format!("{ITEM_SPRITE_ROOT}/{name}/{name}_{}.png", frame + 1)
}

fn collectible_sprite(kind: ItemKind, key: Option<KeyKind>, frame: usize) -> String {
    let frame = frame + 1;
    match kind {
        ItemKind::Coin => format!("{ITEM_SPRITE_ROOT}/coin/coin_{frame}.png"),
        ItemKind::Key => {
            let variant = match key {
                Some(KeyKind::Golden) => 1,
                _ => 2,
            };
            format!("{ITEM_SPRITE_ROOT}/keys/keys_{variant}_{frame}.png")
        }
        ItemKind::Potion => format!("{ITEM_SPRITE_ROOT}/flasks/flasks_1_{frame}.png"),
    }
}

fn collectible_color(kind: ItemKind) -> Color {
    match kind {
        ItemKind::Coin => GOLD,
        ItemKind::Key => SILVER,
        ItemKind::Potion => Color::rgb(220, 40, 120),
    }
}

fn draw_fog(game: &Game, draw_list: &mut DrawList) {
    let fog = game.fog();
    let camera = game.camera();
    let ((start_col, end_col), (start_row, end_row)) = fog.visible_range(camera);
    for row in start_row..end_row {
        for col in start_col..end_col {
            let alpha = fog.alpha_at(col, row);
            if alpha == 0 {
                continue;
            }
            let dest = screen_rect(
                camera,
                col as f32 * TILE_SIZE,
                row as f32 * TILE_SIZE,
                TILE_SIZE,
                TILE_SIZE,
            );
            draw_list.fill_rect(dest, Color::rgba(0, 0, 0, alpha));
        }
    }
}

fn draw_messages(game: &Game, draw_list: &mut DrawList) {
    let camera = game.camera();
    let level = game.level();
    for (_, door) in level.doors.iter() {
        let Some((text, opened)) = door.message() else {
            continue;
        };
        let color = if opened {
            Color::rgb(0, 255, 0)
        } else {
            Color::rgb(255, 0, 0)
        };
        let rect = screen_rect(camera, door.x, door.y, TILE_SIZE, TILE_SIZE);
        draw_list.text_centered(text, rect.x + rect.w / 2, rect.y - 20, HUD_SCALE, color);
    }
    for ladder in &level.ladders {
        let Some(text) = ladder.message() else {
            continue;
        };
        let rect = screen_rect(camera, ladder.x, ladder.y, TILE_SIZE, TILE_SIZE);
        draw_list.text_centered(text, rect.x + rect.w / 2, rect.y - 20, HUD_SCALE, Color::WHITE);
    }
}

fn draw_hud(game: &Game, draw_list: &mut DrawList, width: i32, height: i32) {
    let player = game.player();
    draw_list.text(
        format!("HP: {}/{}", player.hp, player.max_hp),
        10,
        10,
        HUD_SCALE,
        Color::WHITE,
    );
    draw_list.fill_rect(HUD_BAR, HP_BACK);
    let ratio = if player.max_hp > 0 {
        player.hp.max(0) as f32 / player.max_hp as f32
    } else {
        0.0
    };
    let fill_width = (HUD_BAR.w as f32 * ratio) as i32;
    draw_list.fill_rect(PixelRect { w: fill_width, ..HUD_BAR }, HP_FILL);
    draw_list.outline_rect(HUD_BAR, Color::WHITE, 2);

    draw_list.text(format!("Score: {}", player.score), 10, 65, HUD_SCALE, GOLD);
    draw_list.text(
        format!("Silver Keys: {}", player.inventory.count(KeyKind::Silver)),
        10,
        95,
        HUD_SCALE,
        SILVER,
    );
    draw_list.text(
        format!("Golden Keys: {}", player.inventory.count(KeyKind::Golden)),
        10,
        120,
        HUD_SCALE,
        GOLD,
    );
    let hint_x = width - text_width(CONTROLS_HINT, HUD_SCALE) - 10;
    draw_list.text(CONTROLS_HINT, hint_x, height - 30, HUD_SCALE, Color::rgb(150, 150, 150));
}

fn draw_pause_overlay(menu: &MenuList, draw_list: &mut DrawList, width: i32, height: i32) {
    draw_list.fill_rect(PixelRect::new(0, 0, width, height), Color::rgba(0, 0, 0, 128));
    let (center_x, center_y) = (width / 2, height / 2);
    draw_list.text_centered("PAUSED", center_x, center_y - 160, TITLE_SCALE, Color::WHITE);
    draw_list.text_centered(
        "Press ESC to continue",
        center_x,
        center_y - 100,
        HUD_SCALE,
        Color::rgb(200, 200, 200),
    );
    let spacing = 40;
    let top = center_y - 40;
    menu.render(draw_list, center_x, top, spacing);
    let hint_y = top + menu.options().len() as i32 * spacing + 20;
    draw_list.text_centered(NAVIGATION_HINT, center_x, hint_y, HUD_SCALE, Color::rgb(230, 230, 230));
}

fn draw_result_overlay(
    title: &str,
    title_color: Color,
    tint: Color,
    score: u32,
    menu: &MenuList,
    draw_list: &mut DrawList,
    (width, height): (i32, i32),
) {
    draw_list.push(DrawCommand::FillRect {
        rect: PixelRect::new(0, 0, width, height),
        color: tint,
    });
    let (center_x, center_y) = (width / 2, height / 2);
    draw_list.text_centered(title, center_x, center_y - 110, TITLE_SCALE, title_color);
    draw_list.text_centered(
        format!("Final Score: {score}"),
        center_x,
        center_y - 50,
        HUD_SCALE,
        Color::WHITE,
    );
    menu.render(draw_list, center_x, center_y, 36);
    draw_list.text_centered(
        NAVIGATION_HINT,
        center_x,
        center_y + 90,
        HUD_SCALE,
        Color::rgb(230, 230, 230),
    );
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use maze_engine::{InputAction, InputSnapshot};

    use super::*;
    use crate::app::gameplay::game::test_game;
    use crate::app::gameplay::level::Level;

    fn texts(draw_list: &DrawList) -> Vec<String> {
        draw_list
            .commands()
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn hud_reports_player_state() {
        let mut game = test_game(Level::fallback(PathBuf::from("maps/empty.tmx")), 5);
        game.player_mut().hp = 40;
        game.player_mut().add_keys(KeyKind::Golden, 2);
        let mut draw_list = DrawList::new();
        build_frame(&game, &mut draw_list);
        let texts = texts(&draw_list);
        assert!(texts.contains(&"HP: 40/100".to_string()));
        assert!(texts.contains(&"Score: 0".to_string()));
        assert!(texts.contains(&"Golden Keys: 2".to_string()));
        assert!(!texts.contains(&"PAUSED".to_string()));
    }

    #[test]
    fn pause_overlay_lists_options() {
        let mut game = test_game(Level::fallback(PathBuf::from("maps/empty.tmx")), 5);
        game.handle_input(&InputSnapshot::empty().with_action_pressed(InputAction::Pause));
        let mut draw_list = DrawList::new();
        build_frame(&game, &mut draw_list);
        let texts = texts(&draw_list);
        assert!(texts.contains(&"PAUSED".to_string()));
        assert!(texts.contains(&"> Resume".to_string()));
        assert!(texts.contains(&"  Quit".to_string()));
    }

    #[test]
    fn sprite_paths_follow_asset_layout() {
        assert_eq!(
            player_sprite(PlayerState::Run, Facing::Left),
            "assets/RPG_Hero/run/run_left_40x40.png"
        );
        assert_eq!(
            enemy_sprite(Species::Skeleton2, EnemyState::Movement),
            "assets/Enemy_Animations_Set/enemies-skeleton2_movemen.png"
        );
        assert_eq!(
            enemy_sprite(Species::Vampire, EnemyState::AttackWindup),
            "assets/Enemy_Animations_Set/enemies-vampire_attack.png"
        );
        assert!(collectible_sprite(ItemKind::Key, Some(KeyKind::Golden), 0).ends_with("keys/keys_1_1.png"));
        assert!(trap_sprite(TrapKind::Peaks, 2).ends_with("peaks/peaks_3.png"));
    }
}
