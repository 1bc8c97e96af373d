//! Actions, legality, and the phase engine
//!
//! `legal_actions` enumerates the full branching set for the current
//! priority holder; `apply` validates one action, executes it, and then
//! advances through automatic phases until the next decision point or a
//! terminal state. Every state the search sees is therefore a decision
//! point or terminal.

use crate::catalog::{self, GameEvent};
use crate::core::{CardId, Keyword};
use crate::game::combat;
use crate::game::phase::Phase;
use crate::game::state::{Block, GameState, Outcome};
use crate::{Result, SolverError};
use smallvec::SmallVec;
use std::collections::HashSet;

type Payment = SmallVec<[u8; 4]>;
type BlockChoice = SmallVec<[(u8, SmallVec<[u8; 2]>); 4]>;

/// Activated abilities and trigger choices, tagged per card
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ability {
    /// Mutavault: `{1}`: becomes a 2/2 creature until end of turn
    Animate,
    /// Pendelhaven: `{T}`: a 1/1 gets +1/+2 until end of turn
    Pump { target: u8 },
    /// Hammerheim: `{T}`: target a creature (valiant enabler)
    TargetCreature { target: u8 },
    /// Luminarch Aspirant's begin-of-combat counter, when the target
    /// choice is not forced
    CombatCounter { target: u8 },
}

/// One decision by the priority holder
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Action {
    PlayLand { hand: u8 },
    CastCreature { hand: u8, payment: Payment },
    Activate { permanent: u8, ability: Ability, payment: Payment },
    DeclareAttackers { attackers: SmallVec<[u8; 4]> },
    DeclareBlockers { blocks: BlockChoice },
    /// Damage order for a gang-blocked attacker
    AssignCombatDamage { attacker: u8, order: SmallVec<[u8; 2]> },
    Pass,
}

/// Who holds priority in the current phase
pub fn priority_player(state: &GameState) -> u8 {
    match state.phase {
        Phase::DeclareBlockers => GameState::opponent(state.active),
        _ => state.active,
    }
}

/// Static move-ordering rank: land drops, then casts by cost, then
/// activations, attacks, ordering refinements, blocks, pass.
pub fn order_key(state: &GameState, action: &Action) -> u32 {
    match action {
        Action::PlayLand { .. } => 0,
        Action::CastCreature { hand, .. } => {
            1 + catalog::cast_cost(state, priority_player(state), *hand as usize).cmc() as u32
        }
        Action::Activate { .. } => 20,
        Action::DeclareAttackers { attackers } => 40u32.saturating_sub(attackers.len() as u32),
        Action::AssignCombatDamage { .. } => 50,
        Action::DeclareBlockers { blocks } => {
            let total: usize = blocks.iter().map(|(_, b)| b.len()).sum();
            60u32.saturating_sub(total as u32)
        }
        Action::Pass => 100,
    }
}

fn aspirant_pending(state: &GameState) -> Option<(usize, Vec<u8>)> {
    let player = state.active;
    for (i, perm) in state.player(player).battlefield.iter().enumerate() {
        if perm.card == CardId::LuminarchAspirant && !perm.combat_trigger_used {
            let targets: Vec<u8> = state
                .player(player)
                .creatures()
                .filter(|(_, p)| !p.has_keyword(Keyword::Shroud))
                .fold((Vec::new(), Vec::new()), |(mut seen, mut out), (idx, p)| {
                    let sig = p.signature();
                    if !seen.contains(&sig) {
                        seen.push(sig);
                        out.push(idx as u8);
                    }
                    (seen, out)
                })
                .1;
            return Some((i, targets));
        }
    }
    None
}

fn attack_subsets(state: &GameState) -> Vec<SmallVec<[u8; 4]>> {
    let player = state.active;
    // Group eligible attackers by signature so interchangeable creatures
    // (identical tokens) only branch on how many attack, not which.
    let mut groups: Vec<(_, Vec<u8>)> = Vec::new();
    for (i, perm) in state.player(player).battlefield.iter().enumerate() {
        if !perm.can_attack() {
            continue;
        }
        let sig = perm.signature();
        match groups.iter_mut().find(|(s, _)| *s == sig) {
            Some((_, idxs)) => idxs.push(i as u8),
            None => groups.push((sig, vec![i as u8])),
        }
    }

    let mut subsets: Vec<SmallVec<[u8; 4]>> = Vec::new();
    fn gen(
        groups: &[(
            (CardId, i32, i32, u8, u8, bool),
            Vec<u8>,
        )],
        gi: usize,
        current: &mut SmallVec<[u8; 4]>,
        out: &mut Vec<SmallVec<[u8; 4]>>,
    ) {
        if gi == groups.len() {
            if !current.is_empty() {
                let mut subset = current.clone();
                subset.sort_unstable();
                out.push(subset);
            }
            return;
        }
        let (_, idxs) = &groups[gi];
        for count in 0..=idxs.len() {
            let before = current.len();
            current.extend_from_slice(&idxs[..count]);
            gen(groups, gi + 1, current, out);
            current.truncate(before);
        }
    }
    gen(&groups, 0, &mut SmallVec::new(), &mut subsets);
    // Larger attacks first: usually the aggressive line cuts fastest.
    subsets.sort_by_key(|s| std::cmp::Reverse(s.len()));
    subsets
}

type Signature = (CardId, i32, i32, u8, u8, bool);

/// Boards up to this many combatants per side get the exhaustive
/// gang-block enumeration; bigger boards (token swarms) fall back to
/// grouped one-blocker-per-attacker profiles, which stay polynomial.
const FULL_BLOCK_ENUM_LIMIT: usize = 4;

fn block_assignments(state: &GameState) -> Vec<BlockChoice> {
    let defender = GameState::opponent(state.active);
    let attacker_field = &state.player(state.active).battlefield;
    let defender_field = &state.player(defender).battlefield;
    let attackers: Vec<u8> = state.combat.attackers.to_vec();

    // Blockers that can block at least one attacker, with their options.
    let mut blockers: Vec<(u8, Vec<u8>)> = Vec::new();
    for (i, perm) in defender_field.iter().enumerate() {
        let options: Vec<u8> = attackers
            .iter()
            .copied()
            .filter(|&a| perm.can_block(&attacker_field[a as usize]))
            .collect();
        if !options.is_empty() {
            blockers.push((i as u8, options));
        }
    }

    if attackers.len() > FULL_BLOCK_ENUM_LIMIT || blockers.len() > FULL_BLOCK_ENUM_LIMIT {
        return grouped_block_assignments(state, &attackers, &blockers);
    }

    let mut raw: Vec<Vec<Option<u8>>> = Vec::new();
    fn gen(
        blockers: &[(u8, Vec<u8>)],
        bi: usize,
        current: &mut Vec<Option<u8>>,
        out: &mut Vec<Vec<Option<u8>>>,
    ) {
        if bi == blockers.len() {
            out.push(current.clone());
            return;
        }
        current.push(None);
        gen(blockers, bi + 1, current, out);
        current.pop();
        for &a in &blockers[bi].1 {
            current.push(Some(a));
            gen(blockers, bi + 1, current, out);
            current.pop();
        }
    }
    gen(&blockers, 0, &mut Vec::new(), &mut raw);

    // Canonicalize per attacker instance: the dedup key pairs each
    // attacker's signature with the sorted signatures ganged onto it, so
    // "two tokens on one attacker" and "one token on each twin attacker"
    // stay distinct while swapped identical blockers collapse.
    let mut seen: HashSet<Vec<(Signature, Vec<Signature>)>> = HashSet::new();
    let mut result: Vec<BlockChoice> = Vec::new();
    for assignment in raw {
        if assignment.iter().all(|a| a.is_none()) {
            continue; // that's Pass
        }
        let mut choice: BlockChoice = SmallVec::new();
        for &att in &attackers {
            let assigned: SmallVec<[u8; 2]> = blockers
                .iter()
                .zip(&assignment)
                .filter(|(_, a)| **a == Some(att))
                .map(|((b, _), _)| *b)
                .collect();
            if !assigned.is_empty() {
                choice.push((att, assigned));
            }
        }
        let key: Vec<(Signature, Vec<Signature>)> = attackers
            .iter()
            .map(|&att| {
                let mut sigs: Vec<Signature> = choice
                    .iter()
                    .find(|(a, _)| *a == att)
                    .map(|(_, bs)| {
                        bs.iter()
                            .map(|&b| defender_field[b as usize].signature())
                            .collect()
                    })
                    .unwrap_or_default();
                sigs.sort_unstable();
                (attacker_field[att as usize].signature(), sigs)
            })
            .collect();
        if seen.insert(key) {
            result.push(choice);
        }
    }
    result
}

/// Swarm-board fallback: blockers and attackers are grouped by signature
/// and assignments are enumerated as count profiles (how many blockers of
/// each kind block attackers of each kind), one blocker per attacker.
/// Canonical: lowest indices fill each profile. Gang-blocks are not
/// offered on boards this wide.
fn grouped_block_assignments(
    state: &GameState,
    attackers: &[u8],
    blockers: &[(u8, Vec<u8>)],
) -> Vec<BlockChoice> {
    let defender = GameState::opponent(state.active);
    let attacker_field = &state.player(state.active).battlefield;
    let defender_field = &state.player(defender).battlefield;

    // Attacker classes by signature.
    let mut classes: Vec<(Signature, Vec<u8>)> = Vec::new();
    for &a in attackers {
        let sig = attacker_field[a as usize].signature();
        match classes.iter_mut().find(|(s, _)| *s == sig) {
            Some((_, idxs)) => idxs.push(a),
            None => classes.push((sig, vec![a])),
        }
    }
    // Blocker groups by signature, with the set of blockable classes.
    let mut groups: Vec<(Signature, Vec<u8>, Vec<usize>)> = Vec::new();
    for (b, options) in blockers {
        let sig = defender_field[*b as usize].signature();
        let class_options: Vec<usize> = classes
            .iter()
            .enumerate()
            .filter(|(_, (_, idxs))| idxs.iter().any(|a| options.contains(a)))
            .map(|(ci, _)| ci)
            .collect();
        match groups.iter_mut().find(|(s, _, _)| *s == sig) {
            Some((_, idxs, _)) => idxs.push(*b),
            None => groups.push((sig, vec![*b], class_options)),
        }
    }

    // Profile recursion: per blocker group, how many of its members block
    // each attacker class; capacities keep it one blocker per attacker.
    let mut profiles: Vec<Vec<Vec<usize>>> = Vec::new();
    fn gen(
        groups: &[(Signature, Vec<u8>, Vec<usize>)],
        capacity: &mut Vec<usize>,
        gi: usize,
        current: &mut Vec<Vec<usize>>,
        out: &mut Vec<Vec<Vec<usize>>>,
    ) {
        if gi == groups.len() {
            out.push(current.clone());
            return;
        }
        let (_, members, class_options) = &groups[gi];
        let mut counts = vec![0usize; capacity.len()];
        fn distribute(
            groups: &[(Signature, Vec<u8>, Vec<usize>)],
            capacity: &mut Vec<usize>,
            gi: usize,
            class_options: &[usize],
            oi: usize,
            remaining: usize,
            counts: &mut Vec<usize>,
            current: &mut Vec<Vec<usize>>,
            out: &mut Vec<Vec<Vec<usize>>>,
        ) {
            if oi == class_options.len() {
                current.push(counts.clone());
                gen(groups, capacity, gi + 1, current, out);
                current.pop();
                return;
            }
            let class = class_options[oi];
            let max = remaining.min(capacity[class]);
            for n in 0..=max {
                counts[class] = n;
                capacity[class] -= n;
                distribute(
                    groups,
                    capacity,
                    gi,
                    class_options,
                    oi + 1,
                    remaining - n,
                    counts,
                    current,
                    out,
                );
                capacity[class] += n;
                counts[class] = 0;
            }
        }
        distribute(
            groups,
            capacity,
            gi,
            class_options,
            0,
            members.len(),
            &mut counts,
            current,
            out,
        );
    }
    let mut capacity: Vec<usize> = classes.iter().map(|(_, idxs)| idxs.len()).collect();
    gen(&groups, &mut capacity, 0, &mut Vec::new(), &mut profiles);

    let mut result: Vec<BlockChoice> = Vec::new();
    for profile in profiles {
        if profile.iter().all(|counts| counts.iter().all(|&n| n == 0)) {
            continue; // that's Pass
        }
        // Fill the profile with concrete indices, lowest first.
        let mut cursor: Vec<usize> = vec![0; classes.len()];
        let mut choice: BlockChoice = SmallVec::new();
        for (gi, counts) in profile.iter().enumerate() {
            let mut next_member = 0usize;
            for (ci, &n) in counts.iter().enumerate() {
                for _ in 0..n {
                    let attacker = classes[ci].1[cursor[ci]];
                    cursor[ci] += 1;
                    let blocker = groups[gi].1[next_member];
                    next_member += 1;
                    let mut single: SmallVec<[u8; 2]> = SmallVec::new();
                    single.push(blocker);
                    choice.push((attacker, single));
                }
            }
        }
        choice.sort_by_key(|(attacker, _)| *attacker);
        result.push(choice);
    }
    result
}

fn permutations(items: &[u8]) -> Vec<SmallVec<[u8; 2]>> {
    if items.len() <= 1 {
        return vec![items.iter().copied().collect()];
    }
    let mut out = Vec::new();
    for (i, &head) in items.iter().enumerate() {
        let mut rest: Vec<u8> = items.to_vec();
        rest.remove(i);
        for tail in permutations(&rest) {
            let mut perm: SmallVec<[u8; 2]> = SmallVec::new();
            perm.push(head);
            perm.extend_from_slice(&tail);
            out.push(perm);
        }
    }
    out
}

fn pending_damage_order(state: &GameState) -> Option<usize> {
    state
        .combat
        .blocks
        .iter()
        .position(|b| b.blockers.len() >= 2 && !b.ordered)
}

/// The full branching set for the current priority holder.
pub fn legal_actions(state: &GameState) -> Vec<Action> {
    if state.is_over() {
        return Vec::new();
    }
    let player = priority_player(state);
    let mut actions = Vec::new();

    match state.phase {
        Phase::Main1 | Phase::Main2 => {
            let mut seen: Vec<CardId> = Vec::new();
            for i in 0..state.player(player).hand.len() {
                let card = state.player(player).hand[i];
                if seen.contains(&card) {
                    continue;
                }
                seen.push(card);
                if let Some(action) = catalog::play_actions(state, player, i) {
                    actions.push(action);
                }
            }
            for i in 0..state.player(player).battlefield.len() {
                actions.extend(catalog::battlefield_actions(state, player, i));
            }
            actions.push(Action::Pass);
        }
        Phase::BeginCombat => {
            // Only reached as a decision when an Aspirant trigger has a
            // real target choice; the trigger is mandatory, so no Pass.
            if let Some((aspirant, targets)) = aspirant_pending(state) {
                for target in targets {
                    actions.push(Action::Activate {
                        permanent: aspirant as u8,
                        ability: Ability::CombatCounter { target },
                        payment: SmallVec::new(),
                    });
                }
            }
        }
        Phase::DeclareAttackers => {
            for i in 0..state.player(player).battlefield.len() {
                actions.extend(catalog::battlefield_actions(state, player, i));
            }
            for attackers in attack_subsets(state) {
                actions.push(Action::DeclareAttackers { attackers });
            }
            actions.push(Action::Pass);
        }
        Phase::DeclareBlockers => {
            for i in 0..state.player(player).battlefield.len() {
                actions.extend(catalog::battlefield_actions(state, player, i));
            }
            for blocks in block_assignments(state) {
                actions.push(Action::DeclareBlockers { blocks });
            }
            actions.push(Action::Pass);
        }
        Phase::CombatDamage => {
            if let Some(idx) = pending_damage_order(state) {
                let block = &state.combat.blocks[idx];
                for order in permutations(&block.blockers) {
                    actions.push(Action::AssignCombatDamage {
                        attacker: block.attacker,
                        order,
                    });
                }
            }
        }
        _ => {}
    }
    actions
}

/// Apply a legal action and advance to the next decision point.
///
/// Precondition: `action` is in `legal_actions(state)`; anything else is a
/// programming error and fails with `IllegalAction`.
pub fn apply(state: &GameState, action: &Action) -> Result<GameState> {
    if !legal_actions(state).contains(action) {
        return Err(SolverError::IllegalAction {
            phase: state.phase.to_string(),
            action: describe_action(state, action),
        });
    }
    apply_unchecked(state, action)
}

/// The fast path used by the search, which only applies actions it just
/// enumerated.
pub(crate) fn apply_unchecked(state: &GameState, action: &Action) -> Result<GameState> {
    let mut ns = state.clone();
    let player = priority_player(state);

    match action {
        Action::PlayLand { hand } => {
            let card = ns.players[player as usize].hand.remove(*hand as usize);
            ns.players[player as usize]
                .battlefield
                .push(crate::game::state::Permanent::new(card));
            ns.land_played = true;
            let perm = ns.player(player).battlefield.len() - 1;
            ns = catalog::on_event(ns, GameEvent::EnteredBattlefield { player, perm });
        }
        Action::CastCreature { hand, payment } => {
            ns.tap_payment(player, payment);
            let card = ns.players[player as usize].hand.remove(*hand as usize);
            ns.players[player as usize]
                .battlefield
                .push(crate::game::state::Permanent::new(card));
            let perm = ns.player(player).battlefield.len() - 1;
            ns = catalog::on_event(ns, GameEvent::EnteredBattlefield { player, perm });
        }
        Action::Activate { permanent, ability, payment } => {
            ns.tap_payment(player, payment);
            let perm = *permanent as usize;
            match ability {
                Ability::Animate => {
                    ns.players[player as usize].battlefield[perm].animated = true;
                }
                Ability::Pump { target } => {
                    ns.players[player as usize].battlefield[perm].tapped = true;
                    let t = *target as usize;
                    ns.players[player as usize].battlefield[t].pump_power += 1;
                    ns.players[player as usize].battlefield[t].pump_toughness += 2;
                    ns = catalog::become_target(ns, player, t);
                }
                Ability::TargetCreature { target } => {
                    ns.players[player as usize].battlefield[perm].tapped = true;
                    ns = catalog::become_target(ns, player, *target as usize);
                }
                Ability::CombatCounter { target } => {
                    ns.players[player as usize].battlefield[perm].combat_trigger_used = true;
                    let t = *target as usize;
                    ns.players[player as usize].battlefield[t].plus_counters += 1;
                    ns = catalog::become_target(ns, player, t);
                }
            }
        }
        Action::DeclareAttackers { attackers } => {
            for &idx in attackers {
                let perm = &mut ns.players[player as usize].battlefield[idx as usize];
                perm.attacking = true;
                if !perm.has_keyword(Keyword::Vigilance) {
                    perm.tapped = true;
                }
            }
            ns.combat.attackers = attackers.clone();
            ns.phase = Phase::DeclareBlockers;
        }
        Action::DeclareBlockers { blocks } => {
            ns.combat.blocks = blocks
                .iter()
                .map(|(attacker, blockers)| Block {
                    attacker: *attacker,
                    blockers: blockers.clone(),
                    ordered: blockers.len() < 2,
                })
                .collect();
            ns.phase = Phase::CombatDamage;
        }
        Action::AssignCombatDamage { attacker, order } => {
            let block = ns
                .combat
                .blocks
                .iter_mut()
                .find(|b| b.attacker == *attacker)
                .ok_or_else(|| {
                    SolverError::InvariantViolation(format!(
                        "damage order for unblocked attacker {attacker}"
                    ))
                })?;
            block.blockers = order.clone();
            block.ordered = true;
        }
        Action::Pass => match state.phase {
            Phase::Main1 => ns.phase = Phase::BeginCombat,
            Phase::Main2 => ns.phase = Phase::End,
            Phase::DeclareAttackers => ns.phase = Phase::EndOfCombat,
            Phase::DeclareBlockers => ns.phase = Phase::CombatDamage,
            _ => {
                return Err(SolverError::IllegalAction {
                    phase: state.phase.to_string(),
                    action: "Pass".to_string(),
                })
            }
        },
    }

    ns = run_state_based_actions(ns);
    advance(ns)
}

/// State-based sweep: players at zero life lose; creatures with lethal
/// damage die (with their triggers), repeated to fixpoint.
fn run_state_based_actions(mut state: GameState) -> GameState {
    loop {
        if state.is_over() {
            return state;
        }
        let p0_dead = state.players[0].life <= 0;
        let p1_dead = state.players[1].life <= 0;
        match (p0_dead, p1_dead) {
            (true, true) => {
                state.outcome = Some(Outcome::Draw);
                return state;
            }
            (true, false) => {
                state.outcome = Some(Outcome::Winner(1));
                return state;
            }
            (false, true) => {
                state.outcome = Some(Outcome::Winner(0));
                return state;
            }
            (false, false) => {}
        }

        let mut buried = false;
        // Active player's side first, then the opponent's; highest index
        // first within a side so removals don't shift pending ones.
        for &player in &[state.active, GameState::opponent(state.active)] {
            let field_len = state.player(player).battlefield.len();
            for idx in (0..field_len).rev() {
                let perm = &state.player(player).battlefield[idx];
                if perm.is_creature() && perm.toughness() <= perm.damage && perm.damage > 0 {
                    let card = perm.card;
                    let power = perm.power();
                    state.players[player as usize].battlefield.remove(idx);
                    if !card.is_token() {
                        state.players[player as usize].graveyard.push(card);
                    }
                    state = catalog::on_event(state, GameEvent::Died { player, card, power });
                    buried = true;
                }
            }
            if buried {
                break;
            }
        }
        if !buried {
            return state;
        }
    }
}

/// Advance through automatic phases until the next decision point or a
/// terminal state.
pub fn advance(mut state: GameState) -> Result<GameState> {
    loop {
        if state.is_over() {
            // Combat scratch may reference creatures that died on the way
            // to the terminal; it is meaningless once the game is decided.
            state.combat.clear();
            return Ok(state);
        }
        match state.phase {
            Phase::Untap => {
                untap_step(&mut state);
                state.phase = Phase::Upkeep;
            }
            Phase::Upkeep => {
                let player = state.active;
                let field_len = state.player(player).battlefield.len();
                for perm in 0..field_len {
                    state = catalog::on_event(state, GameEvent::Upkeep { player, perm });
                }
                state = run_state_based_actions(state);
                state.phase = Phase::Draw;
            }
            Phase::Draw => {
                if state.draws {
                    let skip = state.turn == 1 && state.active == state.first;
                    if !skip {
                        let player = state.active as usize;
                        if state.players[player].library == 0 {
                            state.outcome =
                                Some(Outcome::Winner(GameState::opponent(state.active)));
                            continue;
                        }
                        state.players[player].library -= 1;
                    }
                }
                state.phase = Phase::Main1;
            }
            Phase::Main1 | Phase::Main2 | Phase::DeclareAttackers | Phase::DeclareBlockers => {
                return Ok(state);
            }
            Phase::BeginCombat => {
                let player = state.active;
                let field_len = state.player(player).battlefield.len();
                for perm in 0..field_len {
                    state = catalog::on_event(state, GameEvent::BeginCombat { player, perm });
                }
                match aspirant_pending(&state) {
                    Some((aspirant, targets)) if targets.is_empty() => {
                        // Nothing targetable: the trigger fizzles.
                        state.players[player as usize].battlefield[aspirant]
                            .combat_trigger_used = true;
                    }
                    Some((aspirant, targets)) if targets.len() == 1 => {
                        // Forced target: resolve the trigger inline.
                        let t = targets[0] as usize;
                        state.players[player as usize].battlefield[aspirant]
                            .combat_trigger_used = true;
                        state.players[player as usize].battlefield[t].plus_counters += 1;
                        state = catalog::become_target(state, player, t);
                    }
                    Some(_) => return Ok(state),
                    None => state.phase = Phase::DeclareAttackers,
                }
            }
            Phase::CombatDamage => {
                if pending_damage_order(&state).is_some() {
                    return Ok(state);
                }
                state = combat::resolve_combat_damage(state);
                state = run_state_based_actions(state);
                state.phase = Phase::EndOfCombat;
            }
            Phase::EndOfCombat => {
                let had_combat = !state.combat.attackers.is_empty();
                let active = state.active as usize;
                for perm in state.players[active].battlefield.iter_mut() {
                    perm.attacking = false;
                }
                state.combat.clear();
                state.phase = if had_combat { Phase::Main2 } else { Phase::End };
            }
            Phase::End => {
                end_step(&mut state);
            }
        }
    }
}

fn untap_step(state: &mut GameState) {
    let active = state.active as usize;
    for perm in state.players[active].battlefield.iter_mut() {
        if perm.stun_counters > 0 {
            // A stun counter is removed instead of untapping.
            perm.stun_counters -= 1;
        } else {
            perm.tapped = false;
        }
        perm.entered_this_turn = false;
        perm.targeted_this_turn = false;
        perm.combat_trigger_used = false;
    }
}

fn end_step(state: &mut GameState) {
    for player in state.players.iter_mut() {
        for perm in player.battlefield.iter_mut() {
            perm.damage = 0;
            perm.pump_power = 0;
            perm.pump_toughness = 0;
            perm.attacking = false;
            perm.animated = false;
        }
    }
    state.combat.clear();
    state.active = GameState::opponent(state.active);
    state.turn += 1;
    state.land_played = false;
    state.phase = Phase::Untap;
}

/// Human-readable rendering of an action in context.
pub fn describe_action(state: &GameState, action: &Action) -> String {
    let player = priority_player(state);
    let perm_name = |p: u8, idx: u8| -> String {
        state
            .player(p)
            .battlefield
            .get(idx as usize)
            .map(|perm| perm.card.name().to_string())
            .unwrap_or_else(|| format!("permanent #{idx}"))
    };
    match action {
        Action::PlayLand { hand } => {
            let name = state
                .player(player)
                .hand
                .get(*hand as usize)
                .map(|c| c.name())
                .unwrap_or("?");
            format!("Play {name}")
        }
        Action::CastCreature { hand, .. } => {
            let name = state
                .player(player)
                .hand
                .get(*hand as usize)
                .map(|c| c.name())
                .unwrap_or("?");
            format!("Cast {name}")
        }
        Action::Activate { permanent, ability, .. } => match ability {
            Ability::Animate => format!("Animate {}", perm_name(player, *permanent)),
            Ability::Pump { target } => {
                format!("Pendelhaven: +1/+2 to {}", perm_name(player, *target))
            }
            Ability::TargetCreature { target } => format!(
                "{} targets {}",
                perm_name(player, *permanent),
                perm_name(player, *target)
            ),
            Ability::CombatCounter { target } => {
                format!("Aspirant: +1/+1 on {}", perm_name(player, *target))
            }
        },
        Action::DeclareAttackers { attackers } => {
            let names: Vec<String> = attackers
                .iter()
                .map(|&a| perm_name(state.active, a))
                .collect();
            format!("Attack with {}", names.join(", "))
        }
        Action::DeclareBlockers { blocks } => {
            let defender = GameState::opponent(state.active);
            let parts: Vec<String> = blocks
                .iter()
                .map(|(attacker, blockers)| {
                    let names: Vec<String> =
                        blockers.iter().map(|&b| perm_name(defender, b)).collect();
                    format!(
                        "{} blocks {}",
                        names.join(" + "),
                        perm_name(state.active, *attacker)
                    )
                })
                .collect();
            parts.join("; ")
        }
        Action::AssignCombatDamage { attacker, order } => {
            let defender = GameState::opponent(state.active);
            let names: Vec<String> = order.iter().map(|&b| perm_name(defender, b)).collect();
            format!(
                "{} damage order: {}",
                perm_name(state.active, *attacker),
                names.join(" then ")
            )
        }
        Action::Pass => match state.phase {
            Phase::DeclareAttackers => "No attacks".to_string(),
            Phase::DeclareBlockers => "No blocks".to_string(),
            _ => "Pass".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;

    fn start(hand0: &[CardId], hand1: &[CardId], first: u8) -> GameState {
        let state = GameState::new(hand0, hand1, first).unwrap();
        advance(state).unwrap()
    }

    fn find<'a>(actions: &'a [Action], pred: impl Fn(&Action) -> bool) -> &'a Action {
        actions.iter().find(|a| pred(a)).expect("action not found")
    }

    #[test]
    fn test_opening_turn_reaches_main() {
        let state = start(
            &[CardId::Plains, CardId::StudentOfWarfare],
            &[CardId::Forest, CardId::ScytheTiger],
            0,
        );
        assert_eq!(state.phase, Phase::Main1);
        assert_eq!(state.turn, 1);
        assert_eq!(priority_player(&state), 0);
    }

    #[test]
    fn test_main_actions_first_turn() {
        let state = start(
            &[CardId::Plains, CardId::StudentOfWarfare],
            &[CardId::Forest, CardId::ScytheTiger],
            0,
        );
        let actions = legal_actions(&state);
        // Land drop and Pass only: no mana is open yet for the Student.
        assert!(actions.iter().any(|a| matches!(a, Action::PlayLand { .. })));
        assert!(!actions.iter().any(|a| matches!(a, Action::CastCreature { .. })));
        assert!(actions.contains(&Action::Pass));
    }

    #[test]
    fn test_land_then_cast_same_turn() {
        let state = start(
            &[CardId::Plains, CardId::StudentOfWarfare],
            &[CardId::Forest, CardId::ScytheTiger],
            0,
        );
        let actions = legal_actions(&state);
        let land = find(&actions, |a| matches!(a, Action::PlayLand { .. }));
        let state = apply(&state, land).unwrap();

        assert!(state.land_played);
        let actions = legal_actions(&state);
        let cast = find(&actions, |a| matches!(a, Action::CastCreature { .. }));
        let state = apply(&state, cast).unwrap();

        assert_eq!(state.player(0).battlefield.len(), 2);
        assert!(state.player(0).battlefield[0].tapped);
        assert!(state.player(0).battlefield[1].entered_this_turn);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_illegal_action_rejected() {
        let state = start(&[CardId::Plains], &[CardId::Forest], 0);
        // Casting from an empty slot index is not in the legal set.
        let bogus = Action::CastCreature {
            hand: 7,
            payment: SmallVec::new(),
        };
        match apply(&state, &bogus) {
            Err(SolverError::IllegalAction { .. }) => {}
            other => panic!("expected IllegalAction, got {other:?}"),
        }
    }

    #[test]
    fn test_second_land_drop_illegal() {
        let state = start(&[CardId::Plains, CardId::Plains], &[], 0);
        let actions = legal_actions(&state);
        let land = find(&actions, |a| matches!(a, Action::PlayLand { .. }));
        let state = apply(&state, land).unwrap();
        let actions = legal_actions(&state);
        assert!(!actions.iter().any(|a| matches!(a, Action::PlayLand { .. })));
    }

    #[test]
    fn test_turn_passes_to_opponent() {
        let mut state = start(&[CardId::Plains], &[CardId::Forest], 0);
        // P0: pass main, no attacks.
        state = apply(&state, &Action::Pass).unwrap();
        assert_eq!(state.phase, Phase::DeclareAttackers);
        state = apply(&state, &Action::Pass).unwrap();
        assert_eq!(state.active, 1);
        assert_eq!(state.turn, 2);
        assert_eq!(state.phase, Phase::Main1);
    }

    #[test]
    fn test_summoning_sickness_blocks_attack() {
        let mut state = start(&[CardId::Forest, CardId::ScytheTiger], &[], 0);
        let land = find(&legal_actions(&state), |a| matches!(a, Action::PlayLand { .. })).clone();
        state = apply(&state, &land).unwrap();
        let cast = find(&legal_actions(&state), |a| {
            matches!(a, Action::CastCreature { .. })
        })
        .clone();
        state = apply(&state, &cast).unwrap();
        state = apply(&state, &Action::Pass).unwrap();
        // Tiger ate the Forest on entry; it is summoning-sick, so the
        // attack phase offers no attacker subsets.
        assert_eq!(state.phase, Phase::DeclareAttackers);
        assert!(!legal_actions(&state)
            .iter()
            .any(|a| matches!(a, Action::DeclareAttackers { .. })));
    }

    #[test]
    fn test_attack_and_no_block_deals_damage() {
        let mut state = start(&[CardId::Forest, CardId::ScytheTiger], &[], 0);
        // Turn 1: land, tiger (sacrifices the forest), pass out.
        for _ in 0..2 {
            let actions = legal_actions(&state);
            let action = actions
                .iter()
                .find(|a| !matches!(a, Action::Pass))
                .unwrap()
                .clone();
            state = apply(&state, &action).unwrap();
        }
        state = apply(&state, &Action::Pass).unwrap(); // main -> combat
        state = apply(&state, &Action::Pass).unwrap(); // no attacks
        // Opponent turn: nothing to do.
        state = apply(&state, &Action::Pass).unwrap();
        state = apply(&state, &Action::Pass).unwrap();

        // Turn 3: tiger attacks.
        assert_eq!(state.active, 0);
        state = apply(&state, &Action::Pass).unwrap();
        let actions = legal_actions(&state);
        let attack = find(&actions, |a| matches!(a, Action::DeclareAttackers { .. }));
        state = apply(&state, attack).unwrap();
        assert_eq!(state.phase, Phase::DeclareBlockers);
        state = apply(&state, &Action::Pass).unwrap();

        // Combat resolved automatically; the unblocked 3/2 connected.
        assert_eq!(state.player(1).life, 17);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_main2_reached_only_after_combat() {
        let mut state = start(&[CardId::Forest, CardId::ScytheTiger], &[], 0);
        // No combat: pass main, pass attacks -> straight to next turn.
        let mut ns = apply(&state, &Action::Pass).unwrap();
        ns = apply(&ns, &Action::Pass).unwrap();
        assert_eq!(ns.active, 1);

        // With an attack, the turn visits Main2.
        for _ in 0..2 {
            let actions = legal_actions(&state);
            let action = actions
                .iter()
                .find(|a| !matches!(a, Action::Pass))
                .unwrap()
                .clone();
            state = apply(&state, &action).unwrap();
        }
        state = apply(&state, &Action::Pass).unwrap();
        state = apply(&state, &Action::Pass).unwrap();
        state = apply(&state, &Action::Pass).unwrap();
        state = apply(&state, &Action::Pass).unwrap();
        assert_eq!(state.active, 0);
        state = apply(&state, &Action::Pass).unwrap();
        let attack = find(&legal_actions(&state), |a| {
            matches!(a, Action::DeclareAttackers { .. })
        })
        .clone();
        state = apply(&state, &attack).unwrap();
        state = apply(&state, &Action::Pass).unwrap();
        assert_eq!(state.phase, Phase::Main2);
    }

    #[test]
    fn test_faerie_stun_counters_gate_untap() {
        let mut state = start(&[CardId::Island, CardId::SleepCursedFaerie], &[], 0);
        for _ in 0..2 {
            let actions = legal_actions(&state);
            let action = actions
                .iter()
                .find(|a| !matches!(a, Action::Pass))
                .unwrap()
                .clone();
            state = apply(&state, &action).unwrap();
        }
        let faerie = &state.player(0).battlefield[1];
        assert!(faerie.tapped);
        assert_eq!(faerie.stun_counters, 3);

        // Three full rounds must pass before the faerie untaps.
        for round in 0..3 {
            state = apply(&state, &Action::Pass).unwrap();
            state = apply(&state, &Action::Pass).unwrap();
            state = apply(&state, &Action::Pass).unwrap();
            state = apply(&state, &Action::Pass).unwrap();
            let faerie = &state.player(0).battlefield[1];
            assert_eq!(faerie.stun_counters, 2 - round);
            assert!(faerie.tapped);
        }
        state = apply(&state, &Action::Pass).unwrap();
        state = apply(&state, &Action::Pass).unwrap();
        state = apply(&state, &Action::Pass).unwrap();
        state = apply(&state, &Action::Pass).unwrap();
        assert!(!state.player(0).battlefield[1].tapped);
    }

    #[test]
    fn test_determinism_of_apply() {
        let state = start(
            &[CardId::Plains, CardId::StudentOfWarfare],
            &[CardId::Island, CardId::SleepCursedFaerie],
            0,
        );
        let actions = legal_actions(&state);
        for action in &actions {
            let a = apply(&state, action).unwrap();
            let b = apply(&state, action).unwrap();
            assert_eq!(a, b);
            assert_eq!(
                crate::game::fingerprint::fingerprint(&a),
                crate::game::fingerprint::fingerprint(&b)
            );
        }
    }
}
