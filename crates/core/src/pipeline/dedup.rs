//! Item-id fan-in: one owning product per item.

use std::collections::BTreeMap;

use crate::marketplace::{ItemId, ItemMapping, ItemOwner, ProductId};

/// Fold mappings into one owner per item id.
///
/// The lowest product id wins, so the result does not depend on the order
/// resolutions completed in. Other products of the same item are dropped.
/// Mappings without an item id are ignored. Output is sorted by item id.
pub fn select_owners(mappings: &[ItemMapping]) -> Vec<ItemOwner> {
    let mut owners: BTreeMap<ItemId, ProductId> = BTreeMap::new();
    for mapping in mappings {
        let Some(item_id) = mapping.item_id else {
            continue;
        };
        owners
            .entry(item_id)
            .and_modify(|owner| *owner = (*owner).min(mapping.product_id))
            .or_insert(mapping.product_id);
    }

    owners
        .into_iter()
        .map(|(item_id, product_id)| ItemOwner {
            product_id,
            item_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(product_id: ProductId, item_id: Option<ItemId>) -> ItemMapping {
        ItemMapping {
            product_id,
            item_id,
        }
    }

    #[test]
    fn test_single_owner_per_item() {
        let owners = select_owners(&[mapping(100, Some(999)), mapping(200, Some(999))]);
        assert_eq!(
            owners,
            vec![ItemOwner {
                product_id: 100,
                item_id: 999
            }]
        );
    }

    #[test]
    fn test_lowest_product_wins_regardless_of_order() {
        let forward = select_owners(&[mapping(100, Some(999)), mapping(50, Some(999))]);
        let backward = select_owners(&[mapping(50, Some(999)), mapping(100, Some(999))]);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].product_id, 50);
    }

    #[test]
    fn test_absent_mappings_ignored() {
        let owners = select_owners(&[mapping(100, None), mapping(200, Some(7))]);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].product_id, 200);
    }

    #[test]
    fn test_distinct_items_sorted_by_item_id() {
        let owners = select_owners(&[
            mapping(1, Some(30)),
            mapping(2, Some(10)),
            mapping(3, Some(20)),
            mapping(4, Some(10)),
        ]);
        let items: Vec<ItemId> = owners.iter().map(|o| o.item_id).collect();
        assert_eq!(items, vec![10, 20, 30]);
        assert_eq!(owners[0].product_id, 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(select_owners(&[]).is_empty());
    }
}
