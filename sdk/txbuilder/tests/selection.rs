use veil_note::{Address, Asset, Note, OutflowType, PublicData, Sum, U256, Utxo, ZkAccount, ZkAddress};
use veil_txbuilder::{BuildError, Ether, FixedSize, TxBuilder};

fn wei(eth: u64) -> U256 {
    U256::from(eth) * U256::exp10(18)
}

fn tenth_wei(tenths: u64) -> U256 {
    U256::from(tenths) * U256::exp10(17)
}

fn alice() -> ZkAccount {
    ZkAccount::from_private_key([0xa1; 32])
}

fn bob() -> ZkAddress {
    ZkAccount::from_private_key([0xb0; 32]).address()
}

fn ether_utxo(owner: &ZkAccount, amount: U256) -> Utxo {
    Utxo::new(Note::new(owner.address(), Asset::ether(amount)))
}

fn token_utxo(owner: &ZkAccount, token: Address, amount: u64) -> Utxo {
    Utxo::new(Note::new(
        owner.address(),
        Asset::erc20(token, U256::from(amount), U256::zero()).unwrap(),
    ))
}

/// 1000 bytes at 10^14 wei per byte: a flat 0.1 ETH fee
fn flat_fee_builder(owner: &ZkAccount) -> TxBuilder<FixedSize> {
    let mut builder = TxBuilder::with_estimator(owner.address(), FixedSize(1_000));
    builder.weight(U256::exp10(14));
    builder
}

#[test]
fn picks_largest_ether_notes_first() {
    let alice = alice();
    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(ether_utxo(&alice, wei(5)))
        .provide(ether_utxo(&alice, wei(3)))
        .provide(ether_utxo(&alice, wei(1)))
        .send_ether(wei(6), bob());

    let tx = builder.build().unwrap();

    let inputs: Vec<U256> = tx.inflow.iter().map(|u| u.asset().eth).collect();
    assert_eq!(inputs, vec![wei(5), wei(3)]);
    assert_eq!(tx.fee, tenth_wei(1));

    assert_eq!(tx.outflow.len(), 2);
    let change = tx.outflow[1].note();
    assert_eq!(change.owner(), &alice.address());
    assert_eq!(change.eth(), tenth_wei(19));

    assert!(tx.verify_balance().is_ok());
}

#[test]
fn ether_shortfall_reports_deficit() {
    let alice = alice();
    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(ether_utxo(&alice, wei(1)))
        .send_ether(wei(1), bob());

    assert_eq!(
        builder.build(),
        Err(BuildError::InsufficientEther {
            required: Ether(tenth_wei(11)),
            available: Ether(wei(1)),
            deficit: Ether(tenth_wei(1)),
        })
    );
}

#[test]
fn erc20_shortfall_leaves_no_partial_state() {
    let alice = alice();
    let token = Address([0x70; 20]);
    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(token_utxo(&alice, token, 1))
        .provide(token_utxo(&alice, token, 3))
        .provide(ether_utxo(&alice, wei(1)));
    builder.send_erc20(token, U256::from(5u64), bob()).unwrap();

    let expected = Err(BuildError::InsufficientErc20 {
        token,
        required: U256::from(5u64),
        available: U256::from(4u64),
        deficit: U256::from(1u64),
    });
    assert_eq!(builder.build(), expected);
    assert_eq!(builder.spendables().len(), 3);
    assert_eq!(builder.build(), expected, "retry must see the same spendables");

    builder.provide(token_utxo(&alice, token, 2));
    let tx = builder.build().unwrap();
    assert!(tx.verify_balance().is_ok());
}

#[test]
fn erc20_change_goes_back_to_sender() {
    let alice = alice();
    let token = Address([0x70; 20]);
    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(token_utxo(&alice, token, 10))
        .provide(token_utxo(&alice, token, 2))
        .provide(ether_utxo(&alice, wei(1)));
    builder.send_erc20(token, U256::from(7u64), bob()).unwrap();

    let tx = builder.build().unwrap();
    let sent_to_self = Sum::from_notes(
        tx.outflow
            .iter()
            .map(|o| o.note())
            .filter(|n| n.owner() == &alice.address()),
    )
    .unwrap();
    assert_eq!(sent_to_self.erc20_amount(&token), U256::from(5u64));
    assert_eq!(sent_to_self.eth, tenth_wei(9));
    assert!(tx.verify_balance().is_ok());
}

#[test]
fn nft_transfer_keeps_other_ids() {
    let alice = alice();
    let token = Address([0x99; 20]);
    let nft = |id: u64| {
        Utxo::new(Note::new(
            alice.address(),
            Asset::nft(token, U256::from(id), U256::zero()).unwrap(),
        ))
    };
    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(nft(1))
        .provide(nft(2))
        .provide(ether_utxo(&alice, wei(1)));
    builder.send_nft(token, U256::from(2u64), bob()).unwrap();

    let tx = builder.build().unwrap();
    let moved = Sum::from_notes(tx.inflow.iter().map(Utxo::note)).unwrap();
    assert_eq!(moved.nft_ids(&token).len(), 1, "id 1 stays unspent");
    assert!(tx.verify_balance().is_ok());
}

#[test]
fn withdrawal_pays_l1_fee_on_top() {
    let alice = alice();
    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(ether_utxo(&alice, wei(3)))
        .withdraw(Asset::ether(wei(2)), Address([0x55; 20]), tenth_wei(2));

    let tx = builder.build().unwrap();
    assert_eq!(tx.l1_fee(), tenth_wei(2));
    assert_eq!(tx.outflow[0].outflow_type(), OutflowType::Withdrawal);
    assert_eq!(
        tx.outflow[0].public_data(),
        Some(&PublicData {
            to: Address([0x55; 20]),
            fee: tenth_wei(2),
        })
    );
    assert_eq!(tx.outflow[1].note().eth(), tenth_wei(7));
    assert!(tx.verify_balance().is_ok());
}

#[test]
fn migration_alongside_token_send() {
    let alice = alice();
    let token = Address([0x70; 20]);
    let l1 = Address([0x66; 20]);
    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(token_utxo(&alice, token, 10))
        .provide(token_utxo(&alice, token, 4))
        .provide(ether_utxo(&alice, wei(1)));
    builder.send_erc20(token, U256::from(3u64), bob()).unwrap();
    builder.migrate(
        Asset::erc20(token, U256::from(5u64), U256::zero()).unwrap(),
        l1,
        tenth_wei(2),
    );

    let tx = builder.build().unwrap();
    assert_eq!(tx.inflow.len(), 3, "both token notes and the ether note");
    assert_eq!(tx.outflow[1].outflow_type(), OutflowType::Migration);
    assert_eq!(
        tx.outflow[1].public_data(),
        Some(&PublicData {
            to: l1,
            fee: tenth_wei(2),
        })
    );
    assert_eq!(tx.n_public_outflows(), 1);
    assert_eq!(tx.l1_fee(), tenth_wei(2));
    assert_eq!(tx.fee, tenth_wei(1));

    let kept = Sum::from_notes(
        tx.outflow
            .iter()
            .map(|o| o.note())
            .filter(|n| n.owner() == &alice.address()),
    )
    .unwrap();
    assert_eq!(kept.erc20_amount(&token), U256::from(6u64));
    assert_eq!(kept.eth, tenth_wei(7));
    assert!(tx.verify_balance().is_ok());
}

#[test]
fn overflowing_ether_is_an_error() {
    let alice = alice();

    let mut builder = TxBuilder::with_estimator(alice.address(), FixedSize(0));
    builder
        .provide(ether_utxo(&alice, U256::MAX - U256::one()))
        .provide(ether_utxo(&alice, U256::from(5u64)))
        .send_ether(U256::MAX, bob());
    assert_eq!(builder.build(), Err(BuildError::Overflow("selected ether")));

    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(ether_utxo(&alice, U256::MAX))
        .send_ether(U256::MAX, bob());
    assert_eq!(builder.build(), Err(BuildError::Overflow("required ether")));

    let mut builder = flat_fee_builder(&alice);
    builder
        .provide(ether_utxo(&alice, wei(1)))
        .send_ether(U256::MAX, bob())
        .send_ether(U256::one(), bob());
    assert!(matches!(builder.build(), Err(BuildError::Note(_))));
}
