//! Contract bindings
//!
//! Each contract lives in its own module so the token event types
//! (`TransferFilter`, `ApprovalFilter`, ...) do not collide.

pub mod dropper {
    use ethers::contract::abigen;

    abigen!(
        Dropper,
        r#"[
            function owner() external view returns (address)
            function transferOwnership(address newOwner) external
            function numClaims() external view returns (uint256)
            function createClaim(uint256 tokenType, address tokenAddress, uint256 tokenId, uint256 amount) external returns (uint256)
            function getClaim(uint256 claimId) external view returns ((uint256,address,uint256,uint256))
            function claimStatus(uint256 claimId) external view returns (bool)
            function setClaimStatus(uint256 claimId, bool status) external
            function setSignerForClaim(uint256 claimId, address signer) external
            function getSignerForClaim(uint256 claimId) external view returns (address)
            function claimMessageHash(uint256 claimId, address claimant, uint256 blockDeadline) external view returns (bytes32)
            function claim(uint256 claimId, uint256 blockDeadline, bytes signature) external
            function getClaimStatus(uint256 claimId, address claimant) external view returns (bool)
            function withdrawERC20(address tokenAddress, uint256 amount) external
            function withdrawERC721(address tokenAddress, uint256 tokenId) external
            function withdrawERC1155(address tokenAddress, uint256 tokenId, uint256 amount) external
            event ClaimCreated(uint256 claimId, uint256 tokenType, address tokenAddress, uint256 tokenId, uint256 amount)
            event ClaimStatusChanged(uint256 claimId, bool status)
            event ClaimSignerChanged(uint256 claimId, address signer)
            event Claimed(uint256 indexed claimId, address indexed claimant)
        ]"#
    );
}

pub mod erc20 {
    use ethers::contract::abigen;

    abigen!(
        MockErc20,
        r#"[
            function name() external view returns (string)
            function symbol() external view returns (string)
            function decimals() external view returns (uint8)
            function totalSupply() external view returns (uint256)
            function balanceOf(address account) external view returns (uint256)
            function allowance(address owner, address spender) external view returns (uint256)
            function approve(address spender, uint256 amount) external returns (bool)
            function transfer(address to, uint256 amount) external returns (bool)
            function transferFrom(address from, address to, uint256 amount) external returns (bool)
            function increaseAllowance(address spender, uint256 addedValue) external returns (bool)
            function decreaseAllowance(address spender, uint256 subtractedValue) external returns (bool)
            function mint(address account, uint256 amount) external
            event Transfer(address indexed from, address indexed to, uint256 value)
            event Approval(address indexed owner, address indexed spender, uint256 value)
        ]"#
    );
}

pub mod erc721 {
    use ethers::contract::abigen;

    abigen!(
        MockERC721,
        r#"[
            function approve(address to, uint256 tokenId) external
            function balanceOf(address owner) external view returns (uint256)
            function getApproved(uint256 tokenId) external view returns (address)
            function isApprovedForAll(address owner, address operator) external view returns (bool)
            function mint(address to, uint256 tokenId) external
            function name() external view returns (string)
            function ownerOf(uint256 tokenId) external view returns (address)
            function safeTransferFrom(address from, address to, uint256 tokenId) external
            function safeTransferFrom(address from, address to, uint256 tokenId, bytes data) external
            function setApprovalForAll(address operator, bool approved) external
            function supportsInterface(bytes4 interfaceId) external view returns (bool)
            function symbol() external view returns (string)
            function tokenByIndex(uint256 index) external view returns (uint256)
            function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256)
            function tokenURI(uint256 tokenId) external view returns (string)
            function totalSupply() external view returns (uint256)
            function transferFrom(address from, address to, uint256 tokenId) external
            event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)
            event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId)
            event ApprovalForAll(address indexed owner, address indexed operator, bool approved)
        ]"#,
        methods {
            safeTransferFrom(address,address,uint256) as safe_transfer_from;
            safeTransferFrom(address,address,uint256,bytes) as safe_transfer_from_with_data;
        }
    );
}

pub mod terminus {
    use ethers::contract::abigen;

    abigen!(
        MockTerminus,
        r#"[
            function setPaymentToken(address newPaymentToken) external
            function paymentToken() external view returns (address)
            function setPoolBasePrice(uint256 newBasePrice) external
            function poolBasePrice() external view returns (uint256)
            function createSimplePool(uint256 capacity) external returns (uint256)
            function createPoolV1(uint256 capacity, bool transferable, bool burnable) external returns (uint256)
            function totalPools() external view returns (uint256)
            function setPoolController(uint256 poolID, address newController) external
            function terminusPoolController(uint256 poolID) external view returns (address)
            function terminusPoolCapacity(uint256 poolID) external view returns (uint256)
            function terminusPoolSupply(uint256 poolID) external view returns (uint256)
            function terminusController() external view returns (address)
            function mint(address to, uint256 poolID, uint256 amount, bytes data) external
            function burn(address from, uint256 poolID, uint256 amount) external
            function balanceOf(address account, uint256 id) external view returns (uint256)
            function setApprovalForAll(address operator, bool approved) external
            function isApprovedForAll(address account, address operator) external view returns (bool)
            function approveForPool(uint256 poolID, address operator) external
            function isApprovedForPool(uint256 poolID, address operator) external view returns (bool)
            function safeTransferFrom(address from, address to, uint256 id, uint256 amount, bytes data) external
            function uri(uint256 poolID) external view returns (string)
            function setURI(uint256 poolID, string poolURI) external
            event TransferSingle(address indexed operator, address indexed from, address indexed to, uint256 id, uint256 value)
            event ApprovalForAll(address indexed account, address indexed operator, bool approved)
            event URI(string value, uint256 indexed id)
        ]"#
    );
}

pub use dropper::{Dropper, DropperEvents};
pub use erc20::MockErc20;
pub use erc721::MockERC721;
pub use terminus::MockTerminus;
