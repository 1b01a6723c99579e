use veil_note::{
    Address, Asset, Fr, Note, Outflow, PublicData, U256, Utxo, Withdrawal, ZkAccount,
    encrypt_note_for,
};
use veil_zktx::{
    DecodeError, Memo, MemoV2, ParsedMemo, Prepayment, SnarkProof, ZkInflow, ZkOutflow, ZkTx,
};

fn dummy_proof() -> SnarkProof {
    let c = |n: u64| U256::from(n) << 200u32;
    SnarkProof {
        pi_a: [c(1), c(2)],
        pi_b: [[c(3), c(4)], [c(5), c(6)]],
        pi_c: [c(7), c(8)],
    }
}

fn outflows(receiver: &ZkAccount) -> (Vec<Outflow>, Note) {
    let note = Note::new(receiver.address(), Asset::ether(U256::from(40u64)));
    let withdrawal = Withdrawal::new(
        Asset::erc20(Address([0x33; 20]), U256::from(9u64), U256::zero()).unwrap(),
        PublicData {
            to: Address([0x44; 20]),
            fee: U256::from(2u64),
        },
    );
    (
        vec![Utxo::new(note.clone()).into(), withdrawal.into()],
        note,
    )
}

fn build_tx(outflow: &[Outflow], swap: Option<Fr>, memo: Option<Memo>) -> ZkTx {
    ZkTx::new(
        vec![
            ZkInflow {
                nullifier: Fr::from(101u64),
                root: Fr::from(202u64),
            },
            ZkInflow {
                nullifier: Fr::from(103u64),
                root: Fr::from(202u64),
            },
        ],
        outflow.iter().map(ZkOutflow::from).collect(),
        U256::from(7_000u64),
        dummy_proof(),
        swap,
        memo,
    )
    .unwrap()
}

#[test]
fn decode_reverses_encode() {
    let receiver = ZkAccount::from_private_key([8u8; 32]);
    let (outflow, _) = outflows(&receiver);

    let memos = [
        None,
        Some(Memo::V1([5u8; 81])),
        Some(Memo::V2(MemoV2::notes(&[[6u8; 81], [7u8; 81]]).unwrap())),
    ];
    for memo in memos {
        for swap in [None, Some(Fr::from(99u64))] {
            let tx = build_tx(&outflow, swap, memo.clone());
            let bytes = tx.encode();
            let decoded = ZkTx::decode(&bytes).unwrap();

            assert_eq!(decoded, tx);
            assert_eq!(decoded.hash(), tx.hash());
            assert_eq!(decoded.size(), bytes.len());
            assert_eq!(decoded.encode(), bytes);
        }
    }
}

#[test]
fn withdrawal_data_survives_the_wire() {
    let receiver = ZkAccount::from_private_key([8u8; 32]);
    let (outflow, _) = outflows(&receiver);
    let decoded = ZkTx::decode(&build_tx(&outflow, None, None).encode()).unwrap();

    let data = decoded.outflow()[1].data.unwrap();
    assert_eq!(data.to, Address([0x44; 20]));
    assert_eq!(data.token_addr, Address([0x33; 20]));
    assert_eq!(data.erc20_amount, U256::from(9u64));
    assert_eq!(data.fee, U256::from(2u64));
    assert_eq!(decoded.outflow()[0].data, None);
}

#[test]
fn truncation_and_trailing_bytes_rejected() {
    let receiver = ZkAccount::from_private_key([8u8; 32]);
    let (outflow, _) = outflows(&receiver);
    let bytes = build_tx(&outflow, Some(Fr::from(1u64)), None).encode();

    for cut in [0, 1, 65, bytes.len() - 1] {
        assert!(matches!(
            ZkTx::decode(&bytes[..cut]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    let mut extended = bytes.clone();
    extended.push(0);
    assert_eq!(ZkTx::decode(&extended), Err(DecodeError::TrailingBytes(1)));
}

#[test]
fn prepayment_memo_roundtrip() {
    let receiver = ZkAccount::from_private_key([8u8; 32]);
    let (outflow, note) = outflows(&receiver);
    let record = Prepayment {
        prepay_fee_in_eth: U256::from(15u64),
        prepay_fee_in_token: U256::from(4u64),
        expiration: 1_735_689_600,
        signature: (0u8..65).collect(),
        notes: vec![encrypt_note_for(&note, &[]).unwrap()],
    };
    let memo = Memo::V2(MemoV2::prepayment(&record).unwrap());
    let tx = ZkTx::decode(&build_tx(&outflow, None, Some(memo)).encode()).unwrap();

    match tx.parse_memo().unwrap() {
        Some(ParsedMemo::Prepayment(parsed)) => {
            assert_eq!(parsed.prepay_fee_in_eth, record.prepay_fee_in_eth);
            assert_eq!(parsed.prepay_fee_in_token, record.prepay_fee_in_token);
            assert_eq!(parsed.expiration, record.expiration);
            assert_eq!(parsed.signature, record.signature);
            assert_eq!(parsed.notes, record.notes);
        }
        other => panic!("expected a prepayment memo, got {other:?}"),
    }
}

#[test]
fn receiver_finds_note_in_memo() {
    let receiver = ZkAccount::from_private_key([8u8; 32]);
    let stranger = ZkAccount::from_private_key([9u8; 32]);
    let (outflow, note) = outflows(&receiver);

    let memo = Memo::V1(encrypt_note_for(&note, &[]).unwrap());
    let tx = build_tx(&outflow, None, Some(memo));

    assert_eq!(tx.decrypt_notes(receiver.viewer(), &[]), vec![note]);
    assert!(tx.decrypt_notes(stranger.viewer(), &[]).is_empty());
    assert!(build_tx(&outflow, None, None).decrypt_notes(receiver.viewer(), &[]).is_empty());
}
