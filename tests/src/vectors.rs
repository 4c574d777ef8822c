// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Request vectors for malformed messages and bad parameters

use jade::proto::{encode_frame, frame, ByteBuf, Network, RpcRequest, Value};

/// Test wallet mnemonic
pub const TEST_MNEMONIC: &str = "fish inner face ginger orchard permit useful method fence kidney chuckle party favorite sunset draw limb science crane oval letter slot invite sadness banana";

pub const TEST_SCRIPT: &str = "76a9145f4fcd4a757c2abf6a0691f59dffae18852bbd7388ac";

pub const TEST_THEIR_PK: &str =
    "03e7cd9230b30bf53753a43add0e88931bac3be21baa4c6465d9f8da9251f2904c";

pub const TEST_HASH_PREVOUTS: &str =
    "95f17695f6329dbcce2aa0b7f1eaff823b19d64d8737d642d6e6147f5ec88342";

/// Regtest policy asset
pub const TEST_REGTEST_BITCOIN: &str =
    "5ac9f65c0efcc4775e0baec4ec03abdde22473cd3cf33c0419ca290e0751b225";

/// Testnet recovery xpub for 2of3 green subaccounts
pub const TEST_RECOVERY_XPUB: &str = "tpubD8G8MPGsm1E4RsRMfDrmAU5h68cY93p9o8J7WmueUfCqSKUvLdRRWqRYxaaDkAXJo9WsiFTYtqQ7YeJc3rMsD7sttjdHKocbvwum7MQwxLy";

/// Well-formed 32 byte value not matching any commitment
pub const BAD_SHA256_VAL: &str =
    "7b386b2b69b5b10c93c03d49ce89b8f18b9539776b24fe172b5b62a99bb4cd22";

/// Well-formed commitment not matching any output
pub const BAD_COMMIT_VAL: &str =
    "097c1b60fdf7d757b879a842cd1f773e46bb8cab0f05ca99550cad639b56d248c8";

/// Single input, single output bitcoin transaction
pub const GOOD_BTC_TX: &str = "02000000010f757ae0b5714cb36e017dfffafe5f3ba8c89ddb969a0ae60d99ee7b5892a2740000000000ffffffff01203f0f00000000001600145f4fcd4a757c2abf6a0691f59dffae18852bbd7300000000";

/// Single input, two output (blinded + fee) liquid transaction
pub const GOOD_LIQUID_TX: &str = "0200000000012413047d152348db4342763a0eece0d99e6e2983b3b46eda07ede58d28f201ad0100000000ffffffff020a2b712848b6f14697590b06622266e8d82cb06030896de79700b15562a20834fb0881e4ace4be80524bcc4f566e46a452ab5f43a49929cbf5743d9e1de879a478a7033fc2cd1c4ce77e4339984f786dba6591bd862cf397e8cb6a99e457e162cad68617a9142e0ef2990318d8c9f7cee627650ba2a84fdda449870125b251070e29ca19043cf33ccd7324e2ddab03ecc4ae0b5e77c4fc0e5cf6c95a0100000000000f4240000000000000";

/// Seed for single-sig address vectors (`set_seed`)
pub const TEST_SEED_SINGLE_SIG: &str =
    "b90e532426d0dc20fffe01037048c018e940300038b165c211915c672e07762c";

/// Known `get_xpub` results for [TEST_MNEMONIC]
pub const XPUB_VECTORS: &[(&[u32], Network, &str)] = &[
    (&[], Network::Testnet, "tpubD6NzVbkrYhZ4Y6YYLhPsm1vVhs7CDSvoxfTTohcNPigN2RkeMJL3gTWav9fCicJsC7eSyARLKi8Q3UU825cz65meRQFFfqTYfBBy3MHC6Vn"),
    (&[], Network::Mainnet, "xpub661MyMwAqRbcGJMgtWQnZ6b8Nk1YE4RkR2sAT9ZE3ovUH95wH5UxY1qkg7aRC7MdQD7YMauTncJMMHyWdDmkCeKMMoVwzJoK5DbZHHhinUQ"),
    (&[], Network::Liquid, "xpub661MyMwAqRbcGJMgtWQnZ6b8Nk1YE4RkR2sAT9ZE3ovUH95wH5UxY1qkg7aRC7MdQD7YMauTncJMMHyWdDmkCeKMMoVwzJoK5DbZHHhinUQ"),
    (&[0], Network::Regtest, "tpubD9wHvxq4yutRJBbRis4guqLvvAZqppKmMJmqDi4HVtVRTRKKTMzomHx77PqcprGZf6UuzwiWn8QWbUx3ECSUStzMHFPJM2e16VUoqEGnkk7"),
    (&[6], Network::Localtest, "tpubD9wHvxq4yutRaYSLLTxkMuSGafH6NyQMJeGhqsug25o2p9KMNqZAcSV1eYcX31eVXf5vS8MYUPp5Cr2HHAkmpgAHQHa7iG4bqW6ajLq6WVk"),
    (&[12, 123], Network::LocaltestLiquid, "tpubDBdwuiH7nSNmLs5ffMyv3jXvZrqFgimAbxXvxhWgXWATBTYPjiBbEDRzanF6YBHCaPoMF8XJNJdsUeXZHBuy3tkUSbEYh3o1M6fEfMfdBV5"),
    (&[18, 986], Network::Mainnet, "xpub6BYx1MizD2XPpY6EuF5Pso8cG5fVHJEWniziGqXcrrcqH96MUiPcuNQkfKSnGx9tCvBJBZx35fiZE3zBbVkZqH89TU4W6HkyE9fSUx9QHNX"),
    (&[2147483651, 2147483648], Network::Mainnet, "xpub69w5Svpcz1iNw383Q4dcKTH7DVwPinVYL8Ka7S61gskwY8SW4YeeCny4xdxhR9yFhPxGDJ9Yne8PNQFoqkVdUK2whQ9bJiZuMarKPtCixrX"),
    (&[2147483651, 2147483651], Network::Liquid, "xpub69w5Svpcz1iP4ocLTZ93HDnRkFwKRUomwEZwFuafNnDhTWirvUFxbtou6KQMT83gnyjZAKmsD8oTST6FTj5dgAZn5EP6KMPZwQGEQu1tqez"),
    (&[2147483692, 0, 1, 2], Network::Liquid, "xpub6EuqgQ82cihXAeztunQZQEdnAKrHWJGwd3JUJ7mAzdhW6v2j8EkC2LvheQKfedt18WbNVDNBL67KUJ9wATEZifdLScyEpfCK2Pq8jxMeEhn"),
];

/// Known bitcoin single-sig addresses for [TEST_SEED_SINGLE_SIG]
pub const SINGLE_SIG_ADDR_VECTORS: &[(Network, &str, &[u32], &str)] = &[
    (Network::Regtest, "sh(wpkh(k))", &[2147483648, 2147483648, 2147483657], "2N8Yn3oXF7Pg38yBpuvoheDS7981vW4vy5b"),
    (Network::Regtest, "wpkh(k)", &[2147483648, 2147483648, 2147483658], "bcrt1qkrkcltr7kx5s5alsvnpvkcfunlrjtwx942zmn4"),
    (Network::Regtest, "pkh(k)", &[2147483648, 2147483648, 2147483659], "mwJDHFp93fuHZysBwU7RTiFXrJZXXcPuUc"),
    (Network::Mainnet, "sh(wpkh(k))", &[2147483648, 2147483648, 2147483657], "3GzZz4bDVwAgwBZHEoBq2GSqvmokj9e4Jx"),
    (Network::Mainnet, "wpkh(k)", &[2147483648, 2147483648, 2147483657], "bc1qpky3r9yuz5gguvuqkrf2dfqtqgutr9evgnjmq6"),
    (Network::Mainnet, "pkh(k)", &[2147483648, 2147483648, 2147483657], "12EZzC9ck31rxaFYKbGwVj1gYXsUwfHuWj"),
    (Network::Testnet, "sh(wpkh(k))", &[2147483648, 2147483648, 2147483657], "2N8Yn3oXF7Pg38yBpuvoheDS7981vW4vy5b"),
    (Network::Testnet, "wpkh(k)", &[2147483648, 2147483648, 2147483657], "tb1qpky3r9yuz5gguvuqkrf2dfqtqgutr9evz4fgmf"),
    (Network::Testnet, "pkh(k)", &[2147483648, 2147483648, 2147483657], "mgkXHFEbZ4T7jgjA3AFKKeE1QXUBrX7qQC"),
];

/// Request expected to fail with an error message containing `expected`
/// (any error where `expected` is empty)
#[derive(Clone, PartialEq, Debug)]
pub struct BadRequest {
    pub id: &'static str,
    pub method: &'static str,
    pub params: Option<Value>,
    pub expected: &'static str,
}

impl BadRequest {
    /// Build the request for this vector
    pub fn request(&self) -> RpcRequest {
        RpcRequest::new(self.id, self.method, self.params.clone())
    }
}

fn bad(id: &'static str, method: &'static str, params: Value, expected: &'static str) -> BadRequest {
    BadRequest {
        id,
        method,
        params: Some(params),
        expected,
    }
}

fn no_params(id: &'static str, method: &'static str, expected: &'static str) -> BadRequest {
    BadRequest {
        id,
        method,
        params: None,
        expected,
    }
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn int(v: i128) -> Value {
    Value::Integer(v)
}

/// Byte string from hex
pub fn bytes(s: &str) -> Value {
    Value::Bytes(hex::decode(s).unwrap_or_default())
}

pub fn raw(b: &[u8]) -> Value {
    Value::Bytes(b.to_vec())
}

pub fn array(v: &[Value]) -> Value {
    Value::Array(v.to_vec())
}

/// Integer path array
pub fn path(p: &[i128]) -> Value {
    Value::Array(p.iter().map(|v| Value::Integer(*v)).collect())
}

pub fn map(entries: &[(&str, Value)]) -> Value {
    Value::Map(
        entries
            .iter()
            .map(|(k, v)| (text(k), v.clone()))
            .collect(),
    )
}

/// Insert or replace a map entry
pub fn with(v: &Value, key: &str, val: Value) -> Value {
    let mut v = v.clone();
    if let Value::Map(m) = &mut v {
        m.insert(text(key), val);
    }
    v
}

/// Remove a map entry
pub fn without(v: &Value, key: &str) -> Value {
    let mut v = v.clone();
    if let Value::Map(m) = &mut v {
        m.remove(&text(key));
    }
    v
}

/// Path longer than the device maximum
fn long_path() -> Value {
    path(&[0, 1, 2].repeat(6))
}

/// Envelope-level malformed messages and the id expected in the reply
pub fn bad_messages() -> Vec<(Value, &'static str)> {
    vec![
        (map(&[("method", text("get_version_info"))]), "00"),
        (map(&[("id", text("2"))]), "2"),
        (map(&[("id", int(123)), ("method", text("get_version_info"))]), "00"),
        (
            map(&[("id", text(&"12345".repeat(8))), ("method", text("get_version_info"))]),
            "00",
        ),
        (map(&[("id", text("4")), ("method", text(&"x".repeat(40)))]), "4"),
    ]
}

/// Raw frames that cannot be decoded to a message at all
pub fn very_bad_messages() -> Vec<Vec<u8>> {
    let mut v = vec![];

    // Not a map
    v.extend(encode_frame(&ByteBuf::new()));
    v.extend(encode_frame(&"This is not valid cbor"));

    // Truncated message
    if let Ok(mut f) = encode_frame(&RpcRequest::new("5", "get_version_info", None::<Value>)) {
        f.truncate(f.len() - 5);
        f.push(frame::FRAME_END);
        v.push(f);
    }

    v
}

/// Methods not present in the registry
pub const UNKNOWN_METHODS: &[&str] = &["dostuff", "get", "sign"];

/// Continuation methods with no pending exchange
pub const UNEXPECTED_METHODS: &[&str] = &[
    "handshake_init",
    "handshake_complete",
    "ota_data",
    "ota_complete",
    "tx_input",
];

/// Bad parameters for general and bitcoin methods
pub fn bad_params() -> Vec<BadRequest> {
    let testnet = ("network", text("testnet"));
    let tx = ("txn", bytes(GOOD_BTC_TX));
    let one = ("num_inputs", int(1));

    let green = |s: Value, b: Value, p: Value| {
        map(&[testnet.clone(), ("subaccount", s), ("branch", b), ("pointer", p)])
    };
    let xpub = |p: Value| map(&[("path", p), testnet.clone()]);
    let msg = |p: Value| map(&[("message", text("XYZ")), ("path", p)]);

    vec![
        no_params("badauth1", "auth_user", "Expecting parameters map"),
        bad("badauth2", "auth_user", map(&[("network", Value::Null)]), "extract valid network"),
        bad("badauth3", "auth_user", map(&[("network", int(1234512345))]), "extract valid network"),
        bad("badauth4", "auth_user", map(&[("network", text(""))]), "extract valid network"),
        bad("badauth5", "auth_user", map(&[("network", text("notanetwork"))]), "extract valid network"),

        no_params("badent1", "add_entropy", "Expecting parameters map"),
        bad("badent2", "add_entropy", map(&[("entropy", Value::Null)]), "valid entropy bytes"),
        bad("badent3", "add_entropy", map(&[("entropy", int(1234512345))]), "valid entropy bytes"),
        bad("badent4", "add_entropy", map(&[("entropy", text(""))]), "valid entropy bytes"),
        bad("badent5", "add_entropy", map(&[("entropy", text("notbinary"))]), "valid entropy bytes"),

        no_params("badota1", "ota", ""),
        bad("badota2", "ota", map(&[("fwsize", int(12345))]), "Bad parameters"),
        bad("badota3", "ota", map(&[("fwsize", text("1234")), ("cmpsize", text("123"))]), "Bad parameters"),
        bad("badota4", "ota", map(&[("fwsize", text("X")), ("cmpsize", text("Y"))]), "Bad parameters"),
        bad("badota5", "ota", map(&[("fwsize", int(1234)), ("cmpsize", int(1234))]), "Bad parameters"),

        no_params("badxpub1", "get_xpub", "Expecting parameters map"),
        bad("badxpub2", "get_xpub", map(&[("notpath", text("X")), testnet.clone()]), "extract valid path"),
        bad("badxpub3", "get_xpub", xpub(text("X")), "extract valid path"),
        bad("badxpub4", "get_xpub", xpub(Value::Null), "extract valid path"),
        bad("badxpub5", "get_xpub", xpub(text("")), "extract valid path"),
        bad("badxpub6", "get_xpub", xpub(array(&[Value::Null])), "extract valid path"),
        bad("badxpub7", "get_xpub", xpub(array(&[text("123"), text("456")])), "extract valid path"),
        bad("badxpub8", "get_xpub", xpub(array(&[text("X"), text("Y"), text("Z")])), "extract valid path"),
        bad("badxpub9", "get_xpub", xpub(long_path()), "extract valid path"),
        bad("badxpub10", "get_xpub", map(&[("path", path(&[1, 2, 3]))]), "valid network"),
        bad("badxpub11", "get_xpub", map(&[("path", path(&[])), ("network", text("invalid"))]), "valid network"),
        bad("badxpub12", "get_xpub", map(&[("path", path(&[1, 2, 3])), ("network", text("invalid"))]), "valid network"),

        no_params("badrecvaddr1", "get_receive_address", "Expecting parameters map"),
        bad("badrecvaddr2", "get_receive_address", green(text("X"), int(1), int(1)), "extract path elements"),
        bad("badrecvaddr3", "get_receive_address", green(int(1), text("X"), int(1)), "extract path elements"),
        bad("badrecvaddr4", "get_receive_address", green(int(1), int(1), text("X")), "extract path elements"),
        bad(
            "badrecvaddr5",
            "get_receive_address",
            with(&with(&green(int(1), int(1), int(1)), "csv_blocks", int(0)), "recovery_xpub", text("notanxpub")),
            "generate valid green address script",
        ),
        bad(
            "badrecvaddr6",
            "get_receive_address",
            with(&with(&green(int(1), int(1), int(1)), "csv_blocks", int(65536)), "recovery_xpub", text(TEST_RECOVERY_XPUB)),
            "generate valid green address script",
        ),
        bad("badrecvaddr7", "get_receive_address", green(int(0), int(0), int(0)), "generate valid green address script"),
        bad("badrecvaddr8", "get_receive_address", green(int(0), int(2), int(0)), "generate valid green address script"),
        bad("badrecvaddr9", "get_receive_address", green(int(0), int(0), int(1000000)), "generate valid green address script"),
        bad(
            "badrecvaddr10",
            "get_receive_address",
            with(&green(int(1), int(1), int(1)), "network", text("invalid")),
            "extract valid network",
        ),
        bad("badrecvaddr11", "get_receive_address", map(&[("path", path(&[1, 2, 3])), testnet.clone()]), "extract path elements"),
        bad(
            "badrecvaddr12",
            "get_receive_address",
            with(&green(int(1), int(1), int(1)), "variant", text("pkh(k)")),
            "extract valid path",
        ),
        bad(
            "badrecvaddr13",
            "get_receive_address",
            map(&[("path", path(&[1, 2, 3])), ("variant", text("p2pkh")), testnet.clone()]),
            "Invalid script variant parameter",
        ),

        // Root key (empty path) is not allowed for message signing
        no_params("badsignmsg1", "sign_message", "Expecting parameters map"),
        bad("badsignmsg2", "sign_message", map(&[("path", path(&[0]))]), "extract message"),
        bad("badsignmsg3", "sign_message", map(&[("message", text("XYZ"))]), "extract valid path"),
        bad("badsignmsg4", "sign_message", map(&[("message", int(12345)), ("path", path(&[0]))]), "extract message"),
        bad("badsignmsg5", "sign_message", map(&[("message", text("")), ("path", path(&[0]))]), "extract message"),
        bad("badsignmsg6", "sign_message", msg(text("")), "extract valid path"),
        bad("badsignmsg7", "sign_message", msg(text("X")), "extract valid path"),
        bad("badsignmsg8", "sign_message", msg(path(&[])), "extract valid path"),
        bad("badsignmsg9", "sign_message", msg(Value::Null), "extract valid path"),
        bad("badsignmsg10", "sign_message", msg(array(&[Value::Null])), "extract valid path"),
        bad("badsignmsg11", "sign_message", msg(array(&[text("123"), text("456"), text("789")])), "extract valid path"),
        bad("badsignmsg12", "sign_message", msg(array(&[text("X"), text("Y"), text("Z")])), "extract valid path"),
        bad("badsignmsg13", "sign_message", msg(long_path()), "extract valid path"),

        no_params("badsigntx1", "sign_tx", "Expecting parameters map"),
        bad("badsigntx2", "sign_tx", map(&[testnet.clone(), tx.clone()]), "valid number of inputs"),
        bad("badsigntx3", "sign_tx", map(&[tx.clone(), one.clone()]), "extract valid network"),
        bad("badsigntx4", "sign_tx", map(&[testnet.clone(), one.clone()]), "extract tx"),
        bad("badsigntx4a", "sign_tx", map(&[testnet.clone(), ("txn", Value::Null), one.clone()]), "extract tx"),
        bad("badsigntx5", "sign_tx", map(&[testnet.clone(), ("txn", raw(b"")), one.clone()]), "extract tx"),
        bad("badsigntx6", "sign_tx", map(&[testnet.clone(), ("txn", text("notbin")), one.clone()]), "extract tx"),
        bad("badsigntx7", "sign_tx", map(&[testnet.clone(), tx.clone(), ("num_inputs", int(2))]), "Unexpected number of inputs"),
        bad("badsigntx8", "sign_tx", map(&[testnet.clone(), tx.clone(), ("num_inputs", int(0))]), "valid number of inputs"),
        bad("badsigntx9", "sign_tx", map(&[testnet.clone(), tx.clone(), ("num_inputs", text("X"))]), "valid number of inputs"),
        bad("badsigntx10", "sign_tx", map(&[testnet.clone(), tx.clone(), ("num_inputs", Value::Null)]), "valid number of inputs"),
        bad(
            "badsigntx11",
            "sign_tx",
            map(&[testnet.clone(), tx.clone(), one.clone(), ("change", array(&[]))]),
            "Unexpected number of output (change) entries",
        ),
        bad(
            "badsigntx12",
            "sign_tx",
            map(&[
                ("network", text("made-up")),
                tx.clone(),
                one.clone(),
                ("change", array(&[map(&[("path", array(&[path(&[1, 2, 3])]))]), map(&[])])),
            ]),
            "extract valid network",
        ),
        bad(
            "badsigntx13",
            "sign_tx",
            map(&[
                ("network", text("localtest-liquid")),
                tx.clone(),
                one.clone(),
                ("change", array(&[map(&[("path", array(&[path(&[1, 2, 3])]))]), map(&[])])),
            ]),
            "not appropriate for liquid",
        ),
        bad(
            "badsigntx14",
            "sign_tx",
            map(&[
                testnet.clone(),
                tx.clone(),
                one.clone(),
                ("change", array(&[map(&[("not_path", array(&[path(&[1, 2, 3])]))])])),
            ]),
            "extract valid change path",
        ),
        bad(
            "badsigntx15",
            "sign_tx",
            map(&[testnet, tx, one, ("change", array(&[Value::Null, Value::Null]))]),
            "Unexpected number of output (change) entries",
        ),
    ]
}

/// Valid `sign_tx` parameters for [GOOD_BTC_TX], used to open a signing exchange
pub fn good_sign_tx() -> Value {
    map(&[
        ("network", text("regtest")),
        ("txn", bytes(GOOD_BTC_TX)),
        ("num_inputs", int(1)),
    ])
}

/// Bad `tx_input` parameters, each following [good_sign_tx]
pub fn bad_tx_inputs() -> Vec<BadRequest> {
    let witness = ("is_witness", Value::Bool(true));
    let p0 = ("path", path(&[0]));

    vec![
        no_params("badinput0", "tx_input", "Expecting parameters map"),
        bad("badinput1", "tx_input", map(&[witness.clone(), ("satoshi", int(120)), ("path", path(&[]))]), "extract valid path"),
        bad("badinput2", "tx_input", map(&[witness.clone(), ("satoshi", int(120)), ("path", long_path())]), "extract valid path"),
        bad("badinput3", "tx_input", map(&[witness.clone(), p0.clone(), ("script", bytes("abcdef"))]), "extract satoshi"),
        bad(
            "badinput4",
            "tx_input",
            map(&[witness.clone(), p0.clone(), ("satoshi", text("120")), ("script", bytes("abcdef"))]),
            "extract satoshi",
        ),
        bad("badinput5", "tx_input", map(&[witness.clone(), p0.clone(), ("satoshi", int(12))]), "extract script"),
        bad(
            "badinput6",
            "tx_input",
            map(&[witness.clone(), p0.clone(), ("satoshi", int(12)), ("script", Value::Null)]),
            "extract script",
        ),
        bad(
            "badinput7",
            "tx_input",
            map(&[witness, p0.clone(), ("satoshi", int(12)), ("script", text("notbin"))]),
            "extract script",
        ),
        bad(
            "badinput8",
            "tx_input",
            map(&[("is_witness", Value::Bool(false)), p0, ("satoshi", int(9)), ("script", bytes("ab"))]),
            "extract input_tx",
        ),
        bad("badinput9", "tx_input", map(&[("is_witness", Value::Bool(false)), ("input_tx", text(""))]), "extract input_tx"),
        bad("badinput10", "tx_input", map(&[("is_witness", Value::Bool(false)), ("input_tx", text("notbin"))]), "extract input_tx"),
        bad("badinput11", "tx_input", map(&[("is_witness", Value::Bool(false)), ("input_tx", text("abc"))]), "extract input_tx"),
    ]
}

/// Bad parameters for liquid methods
pub fn bad_params_liquid() -> Vec<BadRequest> {
    let script = ("script", bytes(TEST_SCRIPT));
    let their_pk = ("their_pubkey", bytes(TEST_THEIR_PK));
    let hp = ("hash_prevouts", bytes(TEST_HASH_PREVOUTS));
    let asset = ("asset_id", bytes(TEST_REGTEST_BITCOIN));
    let idx = ("output_index", int(0));
    let value = ("value", int(123));
    let asset_kind = ("type", text("ASSET"));

    let liquid = ("network", text("localtest-liquid"));
    let tx = ("txn", bytes(GOOD_LIQUID_TX));
    let one = ("num_inputs", int(1));
    let empty_commits = ("trusted_commitments", array(&[map(&[]), map(&[])]));
    let change = |c: &[Value]| ("change", array(c));

    let factor = |t: Value| map(&[hp.clone(), idx.clone(), ("type", t)]);
    let commits = |entries: &[(&str, Value)]| map(entries);

    vec![
        no_params("badblindkey1", "get_blinding_key", "Expecting parameters map"),
        bad("badblindkey2", "get_blinding_key", map(&[("script", Value::Null)]), "extract script"),
        bad("badblindkey3", "get_blinding_key", map(&[("script", int(123))]), "extract script"),
        bad("badblindkey4", "get_blinding_key", map(&[("script", text("notbin"))]), "extract script"),

        no_params("badnonce1", "get_shared_nonce", "Expecting parameters map"),
        bad("badnonce2", "get_shared_nonce", map(&[script.clone()]), "extract their_pubkey"),
        bad("badnonce3", "get_shared_nonce", map(&[their_pk.clone()]), "extract script"),
        bad("badnonce4", "get_shared_nonce", map(&[("script", int(123)), their_pk.clone()]), "extract script"),
        bad("badnonce5", "get_shared_nonce", map(&[("script", text("notbin")), their_pk.clone()]), "extract script"),
        bad("badnonce6", "get_shared_nonce", map(&[script.clone(), ("their_pubkey", int(123))]), "extract their_pubkey"),
        bad("badnonce7", "get_shared_nonce", map(&[script.clone(), ("their_pubkey", text("notbin"))]), "extract their_pubkey"),
        bad("badnonce8", "get_shared_nonce", map(&[script, ("their_pubkey", bytes("ab"))]), "extract their_pubkey"),

        no_params("badblindfac1", "get_blinding_factor", "Expecting parameters map"),
        bad("badblindfac2", "get_blinding_factor", map(&[idx.clone(), asset_kind.clone()]), "extract hash_prevouts"),
        bad(
            "badblindfac3",
            "get_blinding_factor",
            map(&[("hash_prevouts", int(123)), idx.clone(), asset_kind.clone()]),
            "extract hash_prevouts",
        ),
        bad(
            "badblindfac4",
            "get_blinding_factor",
            map(&[hp.clone(), asset_kind.clone(), ("output_index", Value::Null)]),
            "extract output index",
        ),
        bad(
            "badblindfac5",
            "get_blinding_factor",
            map(&[hp.clone(), asset_kind.clone(), ("output_index", text("3"))]),
            "extract output index",
        ),
        bad(
            "badblindfac6",
            "get_blinding_factor",
            map(&[hp.clone(), asset_kind, ("output_index", text("notinteger"))]),
            "extract output index",
        ),
        bad("badblindfac7", "get_blinding_factor", map(&[hp.clone(), idx.clone()]), "extract blinding factor type"),
        bad("badblindfac8", "get_blinding_factor", factor(int(123)), "extract blinding factor type"),
        bad("badblindfac9", "get_blinding_factor", factor(text("BAD")), "Invalid blinding factor type"),
        bad("badblindfac10", "get_blinding_factor", factor(text("ASSETXYZ")), "Invalid blinding factor"),
        bad("badblindfac11", "get_blinding_factor", factor(text("VALUEVERYBAD")), "extract blinding factor type"),

        no_params("badcommit1", "get_commitments", "Expecting parameters map"),
        bad("badcommit2", "get_commitments", commits(&[hp.clone(), idx.clone(), value.clone()]), "extract asset_id"),
        bad("badcommit3", "get_commitments", commits(&[("asset_id", Value::Null), hp.clone(), idx.clone(), value.clone()]), "extract asset_id"),
        bad("badcommit4", "get_commitments", commits(&[("asset_id", int(123)), hp.clone(), idx.clone(), value.clone()]), "extract asset_id"),
        bad("badcommit5", "get_commitments", commits(&[("asset_id", text("notbin")), hp.clone(), idx.clone(), value.clone()]), "extract asset_id"),
        bad("badcommit6", "get_commitments", commits(&[("asset_id", text("123abc")), hp.clone(), idx.clone(), value.clone()]), "extract asset_id"),
        bad("badcommit7", "get_commitments", commits(&[idx.clone(), asset.clone(), value.clone()]), "extract hash_prevouts"),
        bad("badcommit8", "get_commitments", commits(&[("hash_prevouts", Value::Null), idx.clone(), asset.clone(), value.clone()]), "extract hash_prevouts"),
        bad("badcommit9", "get_commitments", commits(&[("hash_prevouts", int(123)), idx.clone(), asset.clone(), value.clone()]), "extract hash_prevouts"),
        bad("badcommit10", "get_commitments", commits(&[("hash_prevouts", text("notbin")), idx.clone(), asset.clone(), value.clone()]), "extract hash_prevouts"),
        bad("badcommit11", "get_commitments", commits(&[("hash_prevouts", text("123abc")), idx.clone(), asset.clone(), value.clone()]), "extract hash_prevouts"),
        bad("badcommit12", "get_commitments", commits(&[hp.clone(), asset.clone(), value.clone()]), "extract output index"),
        bad("badcommit13", "get_commitments", commits(&[hp.clone(), ("output_index", Value::Null), asset.clone(), value.clone()]), "extract output index"),
        bad("badcommit14", "get_commitments", commits(&[hp.clone(), ("output_index", text("0")), asset.clone(), value.clone()]), ""),
        bad("badcommit15", "get_commitments", commits(&[hp.clone(), ("output_index", text("X")), asset.clone(), value.clone()]), ""),
        bad("badcommit16", "get_commitments", commits(&[hp.clone(), idx.clone(), asset.clone()]), "extract value"),
        bad("badcommit17", "get_commitments", commits(&[hp.clone(), idx.clone(), asset.clone(), ("value", text("123"))]), "extract value"),
        bad("badcommit18", "get_commitments", commits(&[hp.clone(), idx.clone(), asset.clone(), value.clone(), ("vbf", raw(b"123"))]), "extract vbf"),
        bad("badcommit19", "get_commitments", commits(&[hp.clone(), idx.clone(), asset.clone(), value.clone(), ("vbf", raw(b"notbin"))]), "extract vbf"),
        bad("badcommit20", "get_commitments", commits(&[hp, idx, asset, value, ("vbf", raw(b"123abc"))]), "extract vbf"),

        no_params("badsignliq1", "sign_liquid_tx", "Expecting parameters map"),
        bad("badsignliq2", "sign_liquid_tx", map(&[tx.clone(), one.clone(), empty_commits.clone()]), "extract valid network"),
        bad("badsignliq2a", "sign_liquid_tx", map(&[liquid.clone(), one.clone(), empty_commits.clone()]), "extract txn"),
        bad("badsignliq2b", "sign_liquid_tx", map(&[liquid.clone(), ("txn", Value::Null), one.clone(), empty_commits.clone()]), "extract txn"),
        bad("badsignliq2c", "sign_liquid_tx", map(&[liquid.clone(), ("txn", raw(b"")), one.clone(), empty_commits.clone()]), "extract txn"),
        bad("badsignliq3", "sign_liquid_tx", map(&[liquid.clone(), ("txn", text("notbin")), one.clone(), empty_commits.clone()]), "extract txn"),
        bad("badsignliq4", "sign_liquid_tx", map(&[liquid.clone(), ("txn", text("123abc")), one.clone(), empty_commits.clone()]), "extract txn"),
        bad("badsignliq5", "sign_liquid_tx", map(&[liquid.clone(), tx.clone(), empty_commits.clone()]), "valid number of inputs"),
        bad(
            "badsignliq6",
            "sign_liquid_tx",
            map(&[liquid.clone(), tx.clone(), ("num_inputs", int(2)), empty_commits.clone()]),
            "Unexpected number of inputs",
        ),
        bad(
            "badsignliq7",
            "sign_liquid_tx",
            map(&[liquid.clone(), tx.clone(), ("num_inputs", text("X")), empty_commits.clone()]),
            "valid number of inputs",
        ),
        bad(
            "badsignliq8",
            "sign_liquid_tx",
            map(&[liquid.clone(), tx.clone(), ("num_inputs", Value::Null), empty_commits.clone()]),
            "valid number of inputs",
        ),
        bad("badsignliq9", "sign_liquid_tx", map(&[liquid.clone(), tx.clone(), ("num_inputs", text("0"))]), "valid number of inputs"),
        bad(
            "badsignliq10",
            "sign_liquid_tx",
            map(&[liquid.clone(), tx.clone(), one.clone(), ("trusted_commitments", Value::Null)]),
            "extract trusted commitments",
        ),
        bad(
            "badsignliq11",
            "sign_liquid_tx",
            map(&[liquid.clone(), tx.clone(), one.clone(), ("trusted_commitments", text("notarray"))]),
            "extract trusted commitments",
        ),
        bad(
            "badsignliq12",
            "sign_liquid_tx",
            map(&[liquid.clone(), tx.clone(), one.clone(), ("trusted_commitments", array(&[map(&[])]))]),
            "Unexpected number of trusted commitments",
        ),
        bad(
            "badsignliq13",
            "sign_liquid_tx",
            map(&[liquid.clone(), tx.clone(), one.clone(), ("trusted_commitments", array(&[map(&[]), map(&[]), map(&[])]))]),
            "Unexpected number of trusted commitments",
        ),
        bad(
            "badsignliq14",
            "sign_liquid_tx",
            map(&[
                ("network", text("made-up")),
                tx.clone(),
                one.clone(),
                empty_commits.clone(),
                change(&[map(&[("path", array(&[path(&[1, 2, 3])]))])]),
            ]),
            "extract valid network",
        ),
        bad(
            "badsignliq15",
            "sign_liquid_tx",
            map(&[liquid.clone(), tx.clone(), one.clone(), empty_commits.clone(), change(&[])]),
            "Unexpected number of output (change) entries",
        ),
        bad(
            "badsignliq16",
            "sign_liquid_tx",
            map(&[
                ("network", text("testnet")),
                tx.clone(),
                one.clone(),
                empty_commits.clone(),
                change(&[map(&[("path", array(&[path(&[1, 2, 3])]))]), map(&[])]),
            ]),
            "only appropriate for liquid",
        ),
        bad(
            "badsignliq17",
            "sign_liquid_tx",
            map(&[liquid, tx, one, empty_commits, change(&[map(&[]), map(&[])])]),
            "extract valid change path",
        ),
    ]
}

/// Valid `sign_liquid_tx` parameters for [GOOD_LIQUID_TX] with the provided
/// commitments (one per output)
pub fn good_sign_liquid_tx(commitments: &[Value]) -> Value {
    map(&[
        ("network", text("localtest-liquid")),
        ("txn", bytes(GOOD_LIQUID_TX)),
        ("num_inputs", int(1)),
        ("trusted_commitments", array(commitments)),
    ])
}

/// Valid non-witness liquid input completing a single input exchange
pub fn good_liquid_input() -> Value {
    map(&[
        ("is_witness", Value::Bool(false)),
        ("path", path(&[0])),
        ("script", bytes("abcd")),
    ])
}

/// Bad liquid `tx_input` parameters, each following [good_sign_liquid_tx]
pub fn bad_liquid_inputs() -> Vec<BadRequest> {
    let witness = ("is_witness", Value::Bool(true));
    let p0 = ("path", path(&[0]));
    let script = ("script", bytes("abcd12"));

    vec![
        no_params("badliqin1", "tx_input", "Expecting parameters map"),
        bad("badliqin2", "tx_input", map(&[witness.clone(), p0.clone()]), "extract script"),
        bad("badliqin3", "tx_input", map(&[witness.clone(), p0.clone(), ("script", Value::Null)]), "extract script"),
        bad("badliqin4", "tx_input", map(&[witness.clone(), p0.clone(), ("script", text("notbin"))]), "extract script"),
        bad("badliqin5", "tx_input", map(&[witness.clone(), p0.clone(), script.clone()]), "extract value commitment"),
        bad(
            "badliqin6",
            "tx_input",
            map(&[witness.clone(), p0.clone(), script.clone(), ("value commitment", int(15200))]),
            "extract value commitment",
        ),
        bad(
            "badliqin7",
            "tx_input",
            map(&[witness, p0, script, ("value commitment", text("notbin"))]),
            "extract value commitment",
        ),
    ]
}

/// Commitments rejected when declared (missing or unparseable fields)
pub fn bad_early_commitments(good: &Value) -> Vec<Value> {
    let mut v: Vec<Value> = [
        "asset_id",
        "value",
        "asset_generator",
        "value_commitment",
        "blinding_key",
        "hmac",
    ]
    .iter()
    .map(|k| without(good, k))
    .collect();

    for (k, val) in [
        ("asset_id", "notbin"),
        ("asset_id", "123abc"),
        ("value", "notint"),
        ("asset_generator", "notbin"),
        ("asset_generator", "123abc"),
        ("value_commitment", "notbin"),
        ("value_commitment", "123abc"),
        ("blinding_key", "notbin"),
        ("blinding_key", "123abc"),
        ("hmac", "notbin"),
        ("hmac", "123abc"),
    ] {
        v.push(with(good, k, text(val)));
    }

    v
}

/// Well-formed commitments that fail verification once inputs are received
pub fn bad_late_commitments(good: &Value) -> Vec<Value> {
    vec![
        with(good, "asset_id", bytes(BAD_SHA256_VAL)),
        with(good, "asset_generator", bytes(BAD_COMMIT_VAL)),
        with(good, "hmac", bytes(BAD_SHA256_VAL)),
        with(good, "value_commitment", bytes(BAD_COMMIT_VAL)),
    ]
}

#[cfg(test)]
mod tests {
    use jade::proto::FrameDecoder;

    use super::*;

    #[test]
    fn vector_ids_unique() {
        let mut ids: Vec<_> = bad_params()
            .iter()
            .chain(bad_params_liquid().iter())
            .chain(bad_tx_inputs().iter())
            .chain(bad_liquid_inputs().iter())
            .map(|b| b.id)
            .collect();
        let n = ids.len();

        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), n);
    }

    #[test]
    fn very_bad_frames() {
        let mut d = FrameDecoder::default();
        let frames = d.feed(&very_bad_messages().concat());

        assert_eq!(frames.len(), 3);
        assert!(frames[2].decode::<Value>().is_err());
    }

    #[test]
    fn commitment_edits() {
        let good = map(&[("asset_id", bytes("00")), ("hmac", bytes("01"))]);

        let early = bad_early_commitments(&good);
        assert_eq!(early.len(), 17);
        assert_eq!(early[0], map(&[("hmac", bytes("01"))]));

        let late = bad_late_commitments(&good);
        assert_eq!(late[0], with(&good, "asset_id", bytes(BAD_SHA256_VAL)));
    }
}
