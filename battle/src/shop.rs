//! Buying, selling and upgrading gems between battles.

use crate::catalog::ContentCatalog;
use crate::error::{ActionError, ActionResult};
use crate::events::BattleEvent;
use crate::rules::Rules;
use crate::state::GameState;
use crate::types::{GemDefinition, GemId};

impl GameState {
    fn ensure_shop_open(&self) -> ActionResult<()> {
        if self.in_battle() {
            return Err(ActionError::BattleInProgress);
        }
        Ok(())
    }

    fn spend_zenny(&mut self, price: i32, events: &mut Vec<BattleEvent>) -> ActionResult<()> {
        if self.player.zenny < price {
            return Err(ActionError::NotEnoughZenny {
                have: self.player.zenny,
                need: price,
            });
        }
        self.player.zenny -= price;
        events.push(BattleEvent::ZennyChanged {
            delta: -price,
            zenny: self.player.zenny,
        });
        Ok(())
    }

    /// Buy a new gem into the bag at its listed price
    pub fn buy_gem(&mut self, def: &GemDefinition) -> ActionResult<Vec<BattleEvent>> {
        self.ensure_shop_open()?;
        let mut events = Vec::new();
        self.spend_zenny(def.price, &mut events)?;

        let gem_id = self.gems.add_to_bag(def);
        log::debug!("bought {} as gem {} for {}", def.key, gem_id, def.price);
        events.push(BattleEvent::GemPurchased {
            gem_id,
            gem_key: def.key.clone(),
            price: def.price,
        });
        Ok(events)
    }

    /// Sell an owned gem back for a share of its listed price.
    ///
    /// Gems whose type is missing from the catalog refund nothing.
    pub fn sell_gem(
        &mut self,
        gem_id: GemId,
        catalog: &ContentCatalog,
        rules: &Rules,
    ) -> ActionResult<Vec<BattleEvent>> {
        self.ensure_shop_open()?;
        let gem = self
            .gems
            .remove(gem_id)
            .ok_or(ActionError::GemNotFound { id: gem_id })?;

        let price = catalog.gem(&gem.key).map(|def| def.price).unwrap_or(0);
        let refund = price * rules.sell_refund_percent / 100;
        self.player.zenny += refund;

        log::debug!("sold gem {} ({}) for {}", gem_id, gem.key, refund);
        Ok(vec![
            BattleEvent::ZennyChanged {
                delta: refund,
                zenny: self.player.zenny,
            },
            BattleEvent::GemSold {
                gem_id,
                gem_key: gem.key,
                refund,
            },
        ])
    }

    /// Raise every amount on a gem by one. Each gem can be upgraded once.
    pub fn upgrade_gem(&mut self, gem_id: GemId, rules: &Rules) -> ActionResult<Vec<BattleEvent>> {
        self.ensure_shop_open()?;
        let gem = self
            .gems
            .find(gem_id)
            .ok_or(ActionError::GemNotFound { id: gem_id })?;
        if gem.upgraded {
            return Err(ActionError::AlreadyUpgraded { id: gem_id });
        }

        let mut events = Vec::new();
        self.spend_zenny(rules.upgrade_price, &mut events)?;

        let Some(gem) = self.gems.find_mut(gem_id) else {
            return Err(ActionError::GemNotFound { id: gem_id });
        };
        gem.effects = gem.effects.iter().map(|e| e.upgraded()).collect();
        gem.upgraded = true;
        events.push(BattleEvent::GemUpgraded {
            gem_id,
            gem_key: gem.key.clone(),
            price: rules.upgrade_price,
        });
        Ok(events)
    }
}
